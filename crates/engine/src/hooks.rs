// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Callbacks a runner makes around each step.

use ce_core::{CancelReason, StepDecision};
use ce_storage::PhaseCheckpoint;
use serde_json::Value;

/// Observer and reviewer of a runner.
///
/// `on_step_start` and `on_step_end` return `Err(reason)` to stop the run
/// cooperatively; the runner then returns without marking the step complete.
pub trait StepHooks {
    fn on_step_start(&mut self, _phase: &str, _step: &str) -> Result<(), CancelReason> {
        Ok(())
    }

    /// Review one attempt's output. Defaults to approving it.
    fn on_step_end(
        &mut self,
        _phase: &str,
        _step: &str,
        _output: &Value,
    ) -> Result<StepDecision, CancelReason> {
        Ok(StepDecision::approve())
    }

    fn on_checkpoint_saved(&mut self, _phase: &str, _step: &str, _checkpoint: &PhaseCheckpoint) {}
}

/// Hooks that approve everything and never stop the run.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl StepHooks for AutoApprove {}
