// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

crate::define_id! {
    /// Identifier used only by these tests.
    pub struct TestId("tst-");
}

#[test]
fn new_ids_carry_prefix_and_are_unique() {
    let a = TestId::new();
    let b = TestId::new();
    assert!(a.as_str().starts_with("tst-"));
    assert_eq!(a.as_str().len(), 23);
    assert_ne!(a, b);
}

#[test]
fn suffix_strips_prefix() {
    let id = TestId::from_string("tst-abcdef");
    assert_eq!(id.suffix(), "abcdef");
}

#[test]
fn suffix_of_foreign_string_is_whole_string() {
    let id = TestId::from_string("other");
    assert_eq!(id.suffix(), "other");
}

#[yare::parameterized(
    truncates = { "tst-abcdefghij", 4, "abcd" },
    shorter   = { "tst-abc", 8, "abc" },
    exact     = { "tst-abcd", 4, "abcd" },
)]
fn short_truncates_suffix(raw: &str, n: usize, expected: &str) {
    assert_eq!(TestId::from_string(raw).short(n), expected);
}

#[test]
fn hash_map_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(TestId::from_string("tst-k"), 42);
    assert_eq!(map.get("tst-k"), Some(&42));
}

#[test]
fn serde_is_transparent() {
    let id = TestId::from_string("tst-xyz");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"tst-xyz\"");
    let parsed: TestId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}
