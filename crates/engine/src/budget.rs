// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded retries of a step's internal work.
//!
//! Separate from the reviewer retry loop: this covers a step repeating its
//! own action (regenerating a manifest that failed validation, re-running a
//! flaky probe). Running out of attempts is fatal to the run.

use crate::step::StepError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    max_attempts: u32,
}

impl RetryBudget {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Call `attempt` with 1-based attempt numbers until it succeeds.
    ///
    /// An interruption stops immediately; any other error is retried until
    /// the budget is spent, then reported as
    /// [`StepError::RetryBudgetExhausted`] with the last error's text.
    pub fn run<T>(
        &self,
        label: &str,
        mut attempt: impl FnMut(u32) -> Result<T, StepError>,
    ) -> Result<T, StepError> {
        let mut last_error = String::new();
        for n in 1..=self.max_attempts {
            match attempt(n) {
                Ok(value) => return Ok(value),
                Err(StepError::Interrupted(reason)) => return Err(StepError::Interrupted(reason)),
                Err(e) => {
                    tracing::warn!(
                        label,
                        attempt = n,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "attempt failed"
                    );
                    last_error = e.to_string();
                }
            }
        }
        Err(StepError::RetryBudgetExhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
#[path = "budget_tests.rs"]
mod tests;
