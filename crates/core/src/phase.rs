// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Phase ordering and resume positions.

use serde::{Deserialize, Serialize};

/// Phases of a chaos engineering cycle, in execution order.
pub const CYCLE_PHASES: [&str; 7] = [
    "preprocess",
    "hypothesis",
    "experiment_plan",
    "experiment",
    "analysis",
    "improvement",
    "postprocess",
];

/// Ordered list of phase names for one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseOrder(Vec<String>);

impl PhaseOrder {
    pub fn new<I, S>(phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(phases.into_iter().map(Into::into).collect())
    }

    pub fn phases(&self) -> &[String] {
        &self.0
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn index_of(&self, phase: &str) -> Option<usize> {
        self.0.iter().position(|p| p == phase)
    }

    /// Phase that runs after `phase`, or `None` for the last or an unknown phase.
    pub fn next_after(&self, phase: &str) -> Option<&str> {
        let idx = self.index_of(phase)?;
        self.0.get(idx + 1).map(String::as_str)
    }

    /// First phase (in order) accepted by `is_pending`.
    pub fn first_where(&self, mut is_pending: impl FnMut(&str) -> bool) -> Option<&str> {
        self.0.iter().map(String::as_str).find(|p| is_pending(p))
    }
}

impl Default for PhaseOrder {
    fn default() -> Self {
        Self::new(CYCLE_PHASES)
    }
}

/// Where a resumed run should begin.
///
/// `step = None` means from the phase's first step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePoint {
    pub phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

impl ResumePoint {
    pub fn phase(phase: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            step: None,
        }
    }

    pub fn step(phase: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            step: Some(step.into()),
        }
    }
}

impl std::fmt::Display for ResumePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.step {
            Some(step) => write!(f, "{}/{}", self.phase, step),
            None => f.write_str(&self.phase),
        }
    }
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;
