// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;

use super::{format_elapsed, format_or_json, format_time_ago, handle_list, truncate, OutputFormat};

#[derive(Debug, Clone, Serialize)]
struct FakeRow {
    id: String,
}

#[yare::parameterized(
    seconds = { 42, "42s" },
    minutes = { 125, "2m" },
    hours = { 7_200, "2h" },
    days = { 200_000, "2d" },
)]
fn elapsed_uses_largest_unit(secs: u64, expected: &str) {
    assert_eq!(format_elapsed(secs), expected);
}

#[test]
fn zero_timestamp_renders_dash() {
    assert_eq!(format_time_ago(0), "-");
}

#[yare::parameterized(
    short = { "Job created", 20, "Job created" },
    exact = { "abcdef", 6, "abcdef" },
    long = { "Phase 1: Hypothesis started", 12, "Phase 1: ..." },
)]
fn truncate_marks_cut(text: &str, max: usize, expected: &str) {
    assert_eq!(truncate(text, max), expected);
}

#[test]
fn list_text_calls_renderer_only_with_items() {
    let mut rendered = 0;
    handle_list(OutputFormat::Text, &[FakeRow { id: "a".into() }], "No jobs", |items, _| {
        rendered = items.len();
    })
    .unwrap();
    assert_eq!(rendered, 1);

    let empty: Vec<FakeRow> = Vec::new();
    handle_list(OutputFormat::Text, &empty, "No jobs", |_, _| panic!("rendered empty list")).unwrap();
}

#[test]
fn json_paths_skip_text_renderers() {
    handle_list(OutputFormat::Json, &[FakeRow { id: "a".into() }], "No jobs", |_, _| {
        panic!("text renderer used for json")
    })
    .unwrap();
    format_or_json(OutputFormat::Json, &FakeRow { id: "b".into() }, || {
        panic!("text renderer used for json")
    })
    .unwrap();
}
