// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only per-job event log.
//!
//! The log's length is the delivery cursor: a consumer that passes back the
//! cursor it last received gets exactly the events appended since, in order.

use ce_core::Event;

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event`, stamping it with `now_ms` if it has no timestamp.
    /// Returns the new cursor.
    pub fn push(&mut self, mut event: Event, now_ms: u64) -> usize {
        event.stamp(now_ms);
        self.events.push(event);
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events appended after `cursor`, plus the cursor to pass next time.
    ///
    /// A cursor beyond the end yields nothing and the current length.
    pub fn since(&self, cursor: usize) -> (Vec<Event>, usize) {
        let len = self.events.len();
        let start = cursor.min(len);
        (self.events[start..].to_vec(), len)
    }
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
