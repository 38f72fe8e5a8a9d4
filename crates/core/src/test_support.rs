// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Event, RetryContext};
use serde_json::json;

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use crate::{Event, JobStatus};
    use proptest::prelude::*;

    pub fn arb_job_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Pending),
            Just(JobStatus::Running),
            Just(JobStatus::Paused),
            Just(JobStatus::Completed),
            Just(JobStatus::Failed),
            Just(JobStatus::Cancelled),
        ]
    }

    /// Stream-logger shaped events with a sequence number in `seq`.
    pub fn arb_event(seq: usize) -> impl Strategy<Value = Event> {
        prop_oneof![
            Just("write"),
            Just("code"),
            Just("subheader"),
            Just("partial"),
        ]
        .prop_flat_map(move |kind| {
            "[a-z ]{0,16}".prop_map(move |text| {
                Event::new(kind)
                    .with("text", text)
                    .with("seq", seq as u64)
            })
        })
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

pub fn write_event(text: &str) -> Event {
    Event::new("write").with("role", "assistant").with("text", text)
}

/// A retry context holding one rejected attempt per feedback line.
pub fn retry_context(feedback: &[&str]) -> RetryContext {
    let mut ctx = RetryContext::default();
    for (i, msg) in feedback.iter().enumerate() {
        ctx.push(json!({ "attempt": i }), Some((*msg).to_string()));
    }
    ctx
}
