// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered, resumable execution of the steps of one phase.
//!
//! A runner executes its steps in declaration order. After each approved
//! step it persists a [`PhaseCheckpoint`] naming the completed steps, their
//! outputs and the next step, so a later run can pick up at `next_step`
//! without repeating finished work.
//!
//! Each attempt goes through the reviewer ([`StepHooks::on_step_end`]):
//! - `retry` records the attempt in the retry history and runs the step again
//! - `cancel` completes the step, checkpoints and stops with
//!   [`CancelReason::Review`]
//! - `approve` moves on; an attached message is queued as feedback and
//!   appended to the instructions artifact

use crate::hooks::StepHooks;
use crate::step::{Step, StepError, StepInputs, StepOutputs};
use ce_core::{CancelReason, RetryContext, StepAction};
use ce_storage::{CheckpointStore, PhaseCheckpoint};
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

/// Output key of the instructions artifact that collects reviewer feedback.
pub const DEFAULT_FEEDBACK_KEY: &str = "ce_instructions";

#[derive(Debug, Error)]
pub enum RunError {
    /// Displays the step's error unchanged; the step name is kept alongside.
    #[error("{error}")]
    Step { step: String, error: StepError },
    #[error("interrupted at step '{step}' ({reason})")]
    Interrupted { step: String, reason: CancelReason },
}

impl RunError {
    /// Cancellation reason when the run was stopped rather than failed.
    pub fn interruption(&self) -> Option<CancelReason> {
        match self {
            RunError::Interrupted { reason, .. } => Some(*reason),
            RunError::Step {
                error: StepError::Interrupted(reason),
                ..
            } => Some(*reason),
            RunError::Step { .. } => None,
        }
    }

    pub fn step(&self) -> &str {
        match self {
            RunError::Step { step, .. } | RunError::Interrupted { step, .. } => step,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Step to start at; earlier steps are restored from the checkpoint.
    pub resume_from: Option<String>,
    /// Caller-provided values. They always win over checkpoint data.
    pub seed: StepOutputs,
    /// History for the first step of this run.
    pub retry_context: Option<RetryContext>,
    pub restore_from_checkpoint: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            resume_from: None,
            seed: StepOutputs::new(),
            retry_context: None,
            restore_from_checkpoint: true,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    ce_core::setters! {
        set {
            seed: StepOutputs,
            restore_from_checkpoint: bool,
        }
        option {
            resume_from: String,
            retry_context: RetryContext,
        }
    }

    pub fn seed_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.seed.insert(key.into(), value);
        self
    }
}

pub struct Runner {
    phase: String,
    store: CheckpointStore,
    steps: Vec<Step>,
    feedback_key: String,
    results: StepOutputs,
    completed: Vec<String>,
    retry: RetryContext,
    backlog: Vec<String>,
}

impl Runner {
    pub fn new(phase: impl Into<String>, store: CheckpointStore) -> Self {
        Self {
            phase: phase.into(),
            store,
            steps: Vec::new(),
            feedback_key: DEFAULT_FEEDBACK_KEY.to_string(),
            results: StepOutputs::new(),
            completed: Vec::new(),
            retry: RetryContext::default(),
            backlog: Vec::new(),
        }
    }

    /// Use a different output key as the instructions artifact.
    pub fn feedback_key(mut self, key: impl Into<String>) -> Self {
        self.feedback_key = key.into();
        self
    }

    /// Append a step. A step with an existing name replaces the earlier one
    /// in place.
    pub fn add_step(mut self, step: Step) -> Self {
        match self.position(step.name()) {
            Some(idx) => {
                tracing::warn!(phase = %self.phase, step = step.name(), "replacing step with duplicate name");
                self.steps[idx] = step;
            }
            None => self.steps.push(step),
        }
        self
    }

    pub fn phase(&self) -> &str {
        &self.phase
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(Step::name)
    }

    pub fn completed_steps(&self) -> &[String] {
        &self.completed
    }

    /// First step not completed yet, if any.
    pub fn current_step(&self) -> Option<&str> {
        self.steps
            .iter()
            .map(Step::name)
            .find(|name| !self.completed.iter().any(|c| c == name))
    }

    pub fn results(&self) -> &StepOutputs {
        &self.results
    }

    /// Retry history of the step currently under review.
    pub fn retry_history(&self) -> &RetryContext {
        &self.retry
    }

    /// Run the steps from the start (or `resume_from`) to the end.
    pub fn run(
        &mut self,
        hooks: &mut dyn StepHooks,
        options: RunOptions,
    ) -> Result<StepOutputs, RunError> {
        let RunOptions {
            resume_from,
            seed,
            retry_context,
            restore_from_checkpoint,
        } = options;

        self.results = seed.clone();
        self.completed.clear();
        self.retry.clear();
        self.backlog.clear();

        let start = match resume_from.as_deref() {
            Some(name) => self.position(name).unwrap_or_else(|| {
                tracing::warn!(phase = %self.phase, step = name, "resume step not found; starting from the first step");
                0
            }),
            None => 0,
        };

        if resume_from.is_some() && restore_from_checkpoint {
            self.restore(start, &seed);
        }
        if let Some(ctx) = retry_context {
            self.retry = ctx;
        }

        tracing::info!(
            phase = %self.phase,
            start = self.steps.get(start).map(Step::name).unwrap_or("-"),
            restored = self.completed.len(),
            "running phase steps"
        );

        for idx in start..self.steps.len() {
            self.run_step(idx, hooks)?;
        }

        Ok(self.results.clone())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name() == name)
    }

    /// Restore outputs, completed steps and pending feedback before `start`.
    fn restore(&mut self, start: usize, seed: &StepOutputs) {
        let Some(checkpoint) = self.store.load(&self.phase) else {
            tracing::info!(phase = %self.phase, "no checkpoint to restore");
            return;
        };

        for (key, value) in checkpoint.data {
            if !seed.contains_key(&key) {
                self.results.insert(key, value);
            }
        }

        // Keep only steps before the resume point, in declaration order.
        self.completed = self.steps[..start]
            .iter()
            .map(Step::name)
            .filter(|name| checkpoint.completed_steps.iter().any(|c| c == name))
            .map(String::from)
            .collect();

        if !checkpoint.feedback_backlog.is_empty() {
            self.backlog = checkpoint.feedback_backlog;
        } else if let Some(pending) = checkpoint.pending_feedback {
            // Written without the backlog: one message.
            self.backlog.push(pending);
        }

        tracing::info!(
            phase = %self.phase,
            completed = ?self.completed,
            pending_feedback = self.backlog.len(),
            "restored from checkpoint"
        );
    }

    fn run_step(&mut self, idx: usize, hooks: &mut dyn StepHooks) -> Result<(), RunError> {
        let name = self.steps[idx].name().to_string();
        let key = self.steps[idx].output_key().to_string();
        let inputs = self.resolve_inputs(idx);

        loop {
            hooks
                .on_step_start(&self.phase, &name)
                .map_err(|reason| interrupted(&name, reason))?;

            tracing::info!(phase = %self.phase, step = %name, attempt = self.retry.len() + 1, "running step");
            let output = self.steps[idx]
                .execute(&inputs, &self.retry)
                .map_err(|e| match e {
                    StepError::Interrupted(reason) => interrupted(&name, reason),
                    error => RunError::Step {
                        step: name.clone(),
                        error,
                    },
                })?;

            self.results.insert(key.clone(), output);
            if key == self.feedback_key {
                self.flush_backlog();
            }

            let output = self.results.get(&key).cloned().unwrap_or(Value::Null);
            let decision = hooks
                .on_step_end(&self.phase, &name, &output)
                .map_err(|reason| interrupted(&name, reason))?;

            match decision.action {
                StepAction::Retry => {
                    tracing::info!(phase = %self.phase, step = %name, "retry requested");
                    self.retry.push(output, decision.message);
                }
                StepAction::Cancel => {
                    tracing::info!(phase = %self.phase, step = %name, "reviewer stopped the run");
                    self.retry.clear();
                    self.complete(idx, hooks, true);
                    return Err(interrupted(&name, CancelReason::Review));
                }
                StepAction::Approve => {
                    if let Some(message) = decision.trimmed_message() {
                        self.backlog.push(message.to_string());
                        if self.results.contains_key(&self.feedback_key) {
                            self.flush_backlog();
                        }
                    }
                    break;
                }
            }
        }

        self.retry.clear();
        self.complete(idx, hooks, false);
        Ok(())
    }

    fn resolve_inputs(&self, idx: usize) -> StepInputs {
        let step = &self.steps[idx];
        let mut values = IndexMap::new();
        for key in step.dependencies() {
            let value = self.results.get(key).cloned();
            if value.is_none() {
                tracing::warn!(phase = %self.phase, step = step.name(), input = %key, "dependency not available");
            }
            values.insert(key.clone(), value);
        }
        StepInputs::new(values)
    }

    /// Append queued feedback to the instructions artifact.
    fn flush_backlog(&mut self) {
        if self.backlog.is_empty() {
            return;
        }
        match self.results.get_mut(&self.feedback_key) {
            Some(Value::String(text)) => {
                for message in self.backlog.drain(..) {
                    text.push_str("\n- User feedback: ");
                    text.push_str(&message);
                }
            }
            _ => {
                tracing::warn!(phase = %self.phase, key = %self.feedback_key, "instructions artifact is not text; feedback left pending");
            }
        }
    }

    fn complete(&mut self, idx: usize, hooks: &mut dyn StepHooks, force_save: bool) {
        let name = self.steps[idx].name().to_string();
        if !self.completed.contains(&name) {
            self.completed.push(name.clone());
        }
        if !(force_save || self.steps[idx].checkpoints()) {
            return;
        }
        let checkpoint = self.checkpoint(idx);
        self.store.save(&self.phase, &checkpoint);
        hooks.on_checkpoint_saved(&self.phase, &name, &checkpoint);
    }

    fn checkpoint(&self, idx: usize) -> PhaseCheckpoint {
        let mut data = IndexMap::new();
        for step in &self.steps {
            if !self.completed.iter().any(|c| c == step.name()) {
                continue;
            }
            if let Some(value) = self.results.get(step.output_key()) {
                data.insert(step.output_key().to_string(), value.clone());
            }
        }
        PhaseCheckpoint {
            completed_steps: self.completed.clone(),
            next_step: self.steps.get(idx + 1).map(|s| s.name().to_string()),
            data,
            pending_feedback: (!self.backlog.is_empty()).then(|| self.backlog.join("\n")),
            feedback_backlog: self.backlog.clone(),
        }
    }
}

fn interrupted(step: &str, reason: CancelReason) -> RunError {
    RunError::Interrupted {
        step: step.to_string(),
        reason,
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
