// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ce_core::test_support::write_event;
use proptest::prelude::*;

#[test]
fn push_stamps_and_returns_cursor() {
    let mut log = EventLog::new();
    assert_eq!(log.push(Event::progress("Job created"), 42), 1);
    assert_eq!(log.push(Event::progress("Phase 1: Hypothesis started"), 50), 2);

    let (events, cursor) = log.since(0);
    assert_eq!(cursor, 2);
    assert_eq!(events[0].ts, 42);
    assert_eq!(events[1].get_str("message"), Some("Phase 1: Hypothesis started"));
}

#[test]
fn explicit_timestamp_is_kept() {
    let mut event = Event::progress("x");
    event.ts = 5;
    let mut log = EventLog::new();
    log.push(event, 99);
    assert_eq!(log.since(0).0[0].ts, 5);
}

#[yare::parameterized(
    at_end = { 3 },
    past_end = { 10 },
)]
fn cursor_at_or_past_end_is_empty(cursor: usize) {
    let mut log = EventLog::new();
    for n in 0..3 {
        log.push(Event::progress(format!("m{n}")), 1);
    }
    let (events, next) = log.since(cursor);
    assert!(events.is_empty());
    assert_eq!(next, 3);
}

proptest! {
    /// Polling with the returned cursor, interleaved with pushes, sees every
    /// event exactly once and in order.
    #[test]
    fn polling_never_repeats_or_skips(batches in prop::collection::vec(0usize..5, 1..12)) {
        let mut log = EventLog::new();
        let mut cursor = 0;
        let mut seen = Vec::new();
        let mut seq = 0u64;

        for batch in batches {
            for _ in 0..batch {
                log.push(write_event(&format!("m{seq}")).with("seq", seq), 1);
                seq += 1;
            }
            let (events, next) = log.since(cursor);
            prop_assert!(next >= cursor);
            seen.extend(events.into_iter().filter_map(|e| e.get("seq").and_then(|v| v.as_u64())));
            cursor = next;
        }

        let expected: Vec<u64> = (0..seq).collect();
        prop_assert_eq!(seen, expected);
    }
}
