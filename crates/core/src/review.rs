// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry/approval protocol exchanged after every step attempt.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One rejected attempt of a step, with the reviewer's feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryEntry {
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Accumulated history of the current retry cycle, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryContext {
    #[serde(default)]
    pub history: Vec<RetryEntry>,
}

impl RetryContext {
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn push(&mut self, output: Value, feedback: Option<String>) {
        self.history.push(RetryEntry { output, feedback });
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn last(&self) -> Option<&RetryEntry> {
        self.history.last()
    }

    /// Feedback messages in order, skipping attempts rejected without one.
    pub fn feedback(&self) -> impl Iterator<Item = &str> {
        self.history.iter().filter_map(|e| e.feedback.as_deref())
    }
}

/// What the reviewer wants done with a step's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Approve,
    Retry,
    Cancel,
}

crate::simple_display! {
    StepAction {
        Approve => "approve",
        Retry => "retry",
        Cancel => "cancel",
    }
}

/// Reviewer decision for one step attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDecision {
    pub action: StepAction,
    /// Feedback for a retry, or an instruction carried forward on approve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StepDecision {
    pub fn approve() -> Self {
        Self {
            action: StepAction::Approve,
            message: None,
        }
    }

    pub fn approve_with(message: impl Into<String>) -> Self {
        Self {
            action: StepAction::Approve,
            message: Some(message.into()),
        }
    }

    pub fn retry(feedback: impl Into<String>) -> Self {
        Self {
            action: StepAction::Retry,
            message: Some(feedback.into()),
        }
    }

    pub fn cancel() -> Self {
        Self {
            action: StepAction::Cancel,
            message: None,
        }
    }

    /// Message with surrounding whitespace removed; blank messages count as none.
    pub fn trimmed_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
#[path = "review_tests.rs"]
mod tests;
