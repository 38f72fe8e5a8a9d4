// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contract between the job manager and a chaos cycle pipeline.
//!
//! A pipeline runs the cycle's phases in order on a worker thread. It reports
//! through a [`PipelineContext`], builds one [`Runner`] per phase and hands
//! the context's hooks to it. [`PhasePlan`] carries the resume bookkeeping
//! every pipeline needs: which phases to skip, where the resumed phase
//! starts, and the per-phase output snapshot.

use crate::hooks::StepHooks;
use crate::runner::{RunError, RunOptions, Runner};
use crate::step::StepError;
use crate::stream::EventSink;
use ce_core::{CancelReason, Event, PhaseOrder, ResumePoint, RetryContext};
use ce_storage::{CheckpointStore, OutputSnapshot};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Everything a pipeline needs to start or resume a cycle.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub request: Value,
    pub work_dir: PathBuf,
    pub resume: Option<ResumePoint>,
    /// Outputs of phases that finished before a restart.
    pub snapshot: Option<OutputSnapshot>,
    /// Reviewer history for the first step of the resumed phase.
    pub retry_context: Option<RetryContext>,
}

impl PipelineInput {
    pub fn new(request: Value, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            request,
            work_dir: work_dir.into(),
            resume: None,
            snapshot: None,
            retry_context: None,
        }
    }

    ce_core::setters! {
        option {
            resume: ResumePoint,
            snapshot: OutputSnapshot,
            retry_context: RetryContext,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Run(#[from] RunError),
    #[error(transparent)]
    Step(#[from] StepError),
    #[error("interrupted: {0}")]
    Interrupted(CancelReason),
    #[error("failed to build pipeline: {0}")]
    Build(String),
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// The cancel reason when the pipeline stopped cooperatively.
    pub fn interruption(&self) -> Option<CancelReason> {
        match self {
            PipelineError::Interrupted(reason) => Some(*reason),
            PipelineError::Run(e) => e.interruption(),
            PipelineError::Step(StepError::Interrupted(reason)) => Some(*reason),
            _ => None,
        }
    }

    /// Name of the step whose error ended the run, when a step failed.
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            PipelineError::Run(e @ RunError::Step { .. }) if e.interruption().is_none() => {
                Some(e.step())
            }
            _ => None,
        }
    }
}

impl From<CancelReason> for PipelineError {
    fn from(reason: CancelReason) -> Self {
        PipelineError::Interrupted(reason)
    }
}

/// What a running pipeline can see of its job.
pub trait PipelineContext: StepHooks {
    /// Replace the job's human-readable progress line.
    fn progress(&mut self, message: &str);

    fn phase_started(&mut self, phase: &str, label: &str);

    fn phase_completed(&mut self, phase: &str, label: &str);

    fn check_cancelled(&self) -> Result<(), CancelReason>;

    /// Sink for streamed step output.
    fn sink(&self) -> Arc<dyn EventSink>;

    fn emit(&mut self, event: Event) -> Result<(), CancelReason> {
        self.sink().emit(event)
    }

    /// The context as runner hooks.
    fn hooks(&mut self) -> &mut dyn StepHooks;
}

pub trait Pipeline: Send {
    fn phases(&self) -> PhaseOrder {
        PhaseOrder::default()
    }

    /// Run (or resume) the cycle. Blocking; called on a worker thread.
    fn run(
        &mut self,
        ctx: &mut dyn PipelineContext,
        input: PipelineInput,
    ) -> Result<Value, PipelineError>;
}

/// Builds a pipeline for one job from its request.
pub trait PipelineFactory: Send + Sync {
    fn build(&self, request: &Value) -> Result<Box<dyn Pipeline>, PipelineError>;
}

impl<F> PipelineFactory for F
where
    F: Fn(&Value) -> Result<Box<dyn Pipeline>, PipelineError> + Send + Sync,
{
    fn build(&self, request: &Value) -> Result<Box<dyn Pipeline>, PipelineError> {
        self(request)
    }
}

/// Human labels of the cycle phases, used in progress lines.
pub fn phase_label(phase: &str) -> &str {
    match phase {
        "preprocess" => "Phase 0: Preprocessing",
        "hypothesis" => "Phase 1: Hypothesis",
        "experiment_plan" => "Phase 2: Experiment planning",
        "experiment" => "Phase 2: Experiment execution",
        "analysis" => "Phase 3: Analysis",
        "improvement" => "Phase 4: Improvement",
        "postprocess" => "Phase EX: Postprocessing",
        other => other,
    }
}

/// Resume bookkeeping for one pipeline run.
#[derive(Debug)]
pub struct PhasePlan {
    order: PhaseOrder,
    work_dir: PathBuf,
    resume: Option<ResumePoint>,
    retry_context: Option<RetryContext>,
    snapshot: OutputSnapshot,
}

impl PhasePlan {
    pub fn new(order: PhaseOrder, input: &PipelineInput) -> Self {
        Self {
            order,
            work_dir: input.work_dir.clone(),
            resume: input.resume.clone(),
            retry_context: input.retry_context.clone(),
            snapshot: input
                .snapshot
                .clone()
                .unwrap_or_else(|| OutputSnapshot::new(&input.work_dir)),
        }
    }

    pub fn order(&self) -> &PhaseOrder {
        &self.order
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn snapshot(&self) -> &OutputSnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> OutputSnapshot {
        self.snapshot
    }

    /// Whether `phase` finished before the resume point.
    pub fn should_skip(&self, phase: &str) -> bool {
        let Some(resume) = &self.resume else {
            return false;
        };
        match (self.order.index_of(phase), self.order.index_of(&resume.phase)) {
            (Some(p), Some(r)) => p < r,
            _ => false,
        }
    }

    pub fn is_resume_phase(&self, phase: &str) -> bool {
        self.resume.as_ref().is_some_and(|r| r.phase == phase)
    }

    pub fn previous_output(&self, phase: &str) -> Option<&Value> {
        self.snapshot.output(phase)
    }

    /// Step the resumed phase starts at; `None` for every other phase.
    pub fn resume_step_for(&self, phase: &str) -> Option<&str> {
        self.resume
            .as_ref()
            .filter(|r| r.phase == phase)
            .and_then(|r| r.step.as_deref())
    }

    /// The initial retry context, handed out once and only to the resumed phase.
    pub fn retry_context_for(&mut self, phase: &str) -> Option<RetryContext> {
        if self.is_resume_phase(phase) {
            self.retry_context.take()
        } else {
            None
        }
    }

    /// Runner options for `phase`.
    pub fn run_options(&mut self, phase: &str) -> RunOptions {
        let mut options = RunOptions::new();
        if let Some(step) = self.resume_step_for(phase) {
            options = options.resume_from(step);
        }
        if let Some(retry) = self.retry_context_for(phase) {
            options = options.retry_context(retry);
        }
        options
    }

    pub fn store(&self) -> CheckpointStore {
        CheckpointStore::for_work_dir(&self.work_dir)
    }

    /// Fresh runner for `phase` backed by this work dir's checkpoint file.
    pub fn runner(&self, phase: &str) -> Runner {
        Runner::new(phase, self.store())
    }

    /// Record a finished phase and persist the snapshot.
    pub fn record(&mut self, phase: &str, output: Value, elapsed: Duration) {
        self.snapshot.record_phase(phase, output, elapsed);
        if let Err(e) = self.snapshot.save_to_work_dir(&self.work_dir) {
            tracing::warn!(phase, error = %e, "failed to save output snapshot");
        }
    }

    /// Run one phase through `body`, or return its recorded output when it
    /// finished before the resume point.
    pub fn run_phase<F>(
        &mut self,
        ctx: &mut dyn PipelineContext,
        phase: &str,
        body: F,
    ) -> Result<Value, PipelineError>
    where
        F: FnOnce(&mut dyn PipelineContext, RunOptions) -> Result<Value, PipelineError>,
    {
        if self.should_skip(phase) {
            tracing::info!(phase, "skipping phase finished before resume point");
            return Ok(self.previous_output(phase).cloned().unwrap_or(Value::Null));
        }
        ctx.check_cancelled()?;

        let label = phase_label(phase);
        ctx.phase_started(phase, label);
        let started = Instant::now();
        let options = self.run_options(phase);
        let output = body(ctx, options)?;
        self.record(phase, output.clone(), started.elapsed());
        ctx.phase_completed(phase, label);
        Ok(output)
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
