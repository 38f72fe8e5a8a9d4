// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured events appended to a job's event log.

use crate::job::JobStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single event record: a `type` tag, a timestamp and free-form fields.
///
/// Serializes flat, e.g. `{"type":"progress","ts":1700000000000,"message":"..."}`.
/// A zero `ts` means "not stamped yet"; the job manager stamps it on arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub ts: u64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Event {
    pub const PROGRESS: &'static str = "progress";
    pub const STATUS: &'static str = "status";
    pub const STEP_START: &'static str = "step_start";
    pub const CHECKPOINT: &'static str = "checkpoint";
    pub const REVIEW_REQUEST: &'static str = "review_request";
    pub const STEP_FAILED: &'static str = "step_failed";

    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ts: 0,
            fields: Map::new(),
        }
    }

    /// Add or replace a field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Set the timestamp unless one is already present.
    pub fn stamp(&mut self, now_ms: u64) {
        if self.ts == 0 {
            self.ts = now_ms;
        }
    }

    /// Insert `value` under `key` only if the field is missing.
    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) {
        if !self.fields.contains_key(key) {
            self.fields.insert(key.to_string(), value.into());
        }
    }

    pub fn progress(message: impl Into<String>) -> Self {
        Self::new(Self::PROGRESS).with("message", message.into())
    }

    pub fn status(status: JobStatus) -> Self {
        Self::new(Self::STATUS).with("status", status.to_string())
    }

    pub fn step_started(phase: &str, step: &str) -> Self {
        Self::new(Self::STEP_START)
            .with("phase", phase)
            .with("step", step)
    }

    pub fn checkpoint(phase: &str, step: &str, next_step: Option<&str>) -> Self {
        Self::new(Self::CHECKPOINT)
            .with("phase", phase)
            .with("step", step)
            .with("next_step", next_step.map_or(Value::Null, Value::from))
    }

    /// The step whose error failed the job; `error` is the error text as is.
    pub fn step_failed(phase: Option<&str>, step: &str, error: &str) -> Self {
        Self::new(Self::STEP_FAILED)
            .with("phase", phase.map_or(Value::Null, Value::from))
            .with("step", step)
            .with("error", error)
    }

    pub fn review_requested(phase: &str, step: &str, output: Value) -> Self {
        Self::new(Self::REVIEW_REQUEST)
            .with("phase", phase)
            .with("step", step)
            .with("output", output)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
