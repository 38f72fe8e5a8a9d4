// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Async side of a running job.
//!
//! The coordinator flips the job to Running, starts the pipeline on the
//! blocking pool and applies worker updates to the registry until the worker
//! finishes or the job's token is cancelled. On cancellation it stops
//! applying updates and only reaps the worker; the status set by pause or
//! cancel stands.

use std::sync::Arc;

use ce_core::{CancelFlag, CancelReason, Clock, Event, JobId, JobStatus};
use ce_engine::{Pipeline, PipelineError, PipelineInput};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::worker::{JobUpdate, Relay, WorkerContext, RELAY_CAPACITY};
use super::{
    write_log_lines, JobManager, Launch, LogLine, ManagerError, PendingReview, Registry,
    ReviewMode, ReviewRequest, Shared, TaskHandle,
};

enum Outcome {
    Finished(Result<Value, PipelineError>),
    Panicked(String),
    /// The job was paused or cancelled while the worker ran.
    Abandoned,
}

impl<C: Clock> JobManager<C> {
    /// Start a coordinator for `id` running `pipeline`.
    ///
    /// Must be called from within a Tokio runtime.
    pub(super) fn launch(
        &self,
        id: &JobId,
        pipeline: Box<dyn Pipeline>,
        launch: Launch,
    ) -> Result<(), ManagerError> {
        let flag = CancelFlag::new();
        let token = CancellationToken::new();

        let (input, review) = {
            let mut reg = self.shared.registry.lock();
            let entry = reg.entry(id)?;
            let starting = entry.job.status == JobStatus::Pending && reg.tasks.contains_key(id);
            if entry.job.status == JobStatus::Running || starting {
                return Err(ManagerError::Conflict {
                    id: id.clone(),
                    status: entry.job.status,
                    action: "start",
                });
            }
            let input = PipelineInput {
                request: entry.spec.request.clone(),
                work_dir: entry.job.work_dir.clone(),
                resume: launch.resume,
                snapshot: launch.snapshot,
                retry_context: launch.retry_context,
            };
            let review = entry.spec.review;
            let now = self.shared.now_ms();
            if let Ok(entry) = reg.entry_mut(id) {
                entry.job.error = None;
                entry.job.result = None;
            }
            reg.set_status(id, JobStatus::Pending, now);
            reg.tasks.insert(
                id.clone(),
                TaskHandle {
                    flag: flag.clone(),
                    token: token.clone(),
                    join: None,
                },
            );
            (input, review)
        };

        let join = tokio::spawn(coordinate(
            Arc::clone(&self.shared),
            id.clone(),
            pipeline,
            input,
            review,
            flag.clone(),
            token,
        ));

        let mut reg = self.shared.registry.lock();
        if let Some(task) = reg.tasks.get_mut(id) {
            if task.flag.same_as(&flag) {
                task.join = Some(join);
            }
        }
        Ok(())
    }
}

async fn coordinate<C: Clock>(
    shared: Arc<Shared<C>>,
    id: JobId,
    mut pipeline: Box<dyn Pipeline>,
    input: PipelineInput,
    review: ReviewMode,
    flag: CancelFlag,
    token: CancellationToken,
) {
    {
        let now = shared.now_ms();
        let mut reg = shared.registry.lock();
        let pending = reg
            .jobs
            .get(&id)
            .is_some_and(|entry| entry.job.status == JobStatus::Pending);
        if !pending || flag.is_set() {
            reg.release_task(&id, &flag);
            return;
        }
        reg.set_status(&id, JobStatus::Running, now);
    }
    tracing::info!(job_id = %id, resume = ?input.resume, "job started");

    let (tx, mut rx) = mpsc::channel(RELAY_CAPACITY);
    let relay = Relay::new(id.clone(), tx, shared.config.relay_timeout);
    let mut ctx = WorkerContext::new(relay, flag.clone(), review, &shared.config);
    let mut worker = tokio::task::spawn_blocking(move || pipeline.run(&mut ctx, input));

    let outcome = loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                drop(rx);
                if let Err(e) = (&mut worker).await {
                    tracing::warn!(job_id = %id, error = %e, "abandoned worker panicked");
                }
                break Outcome::Abandoned;
            }
            Some(update) = rx.recv() => apply(&shared, &id, update),
            joined = &mut worker => {
                while let Ok(update) = rx.try_recv() {
                    apply(&shared, &id, update);
                }
                break match joined {
                    Ok(result) => Outcome::Finished(result),
                    Err(e) => Outcome::Panicked(e.to_string()),
                };
            }
        }
    };

    finalize(&shared, &id, &flag, outcome);
}

/// Apply one worker update. Ignored unless the job is still Running.
fn apply<C: Clock>(shared: &Shared<C>, id: &JobId, update: JobUpdate) {
    let now = shared.now_ms();
    let mut lines = Vec::new();
    {
        let mut reg = shared.registry.lock();
        let running = reg
            .jobs
            .get(id)
            .is_some_and(|entry| entry.job.status == JobStatus::Running);
        if !running {
            tracing::debug!(job_id = %id, "dropping update for job that is no longer running");
            return;
        }

        match update {
            JobUpdate::Progress(message) => {
                lines.extend(reg.set_progress(id, &message, now));
            }
            JobUpdate::Event(event) => {
                reg.push_event(id, event, now);
            }
            JobUpdate::PhaseStarted { phase, label } => {
                if let Some(entry) = reg.jobs.get_mut(id) {
                    entry.job.current_phase = Some(phase.clone());
                    entry.job.current_step = None;
                }
                reg.push_event(id, Event::new("phase_start").with("phase", phase), now);
                lines.extend(reg.set_progress(id, &format!("{label} started"), now));
            }
            JobUpdate::PhaseCompleted { phase, label } => {
                reg.push_event(id, Event::new("phase_end").with("phase", phase), now);
                lines.extend(reg.set_progress(id, &format!("{label} completed"), now));
            }
            JobUpdate::StepStarted { phase, step } => {
                if let Some(entry) = reg.jobs.get_mut(id) {
                    entry.job.current_phase = Some(phase.clone());
                    entry.job.current_step = Some(step.clone());
                    entry.job.updated_at_ms = now;
                    lines.push(LogLine::new(
                        &entry.job.work_dir,
                        format!("{phase}/{step}"),
                        "step started",
                    ));
                }
                reg.push_event(id, Event::step_started(&phase, &step), now);
            }
            JobUpdate::CheckpointSaved {
                phase,
                step,
                next_step,
            } => {
                reg.push_event(
                    id,
                    Event::checkpoint(&phase, &step, next_step.as_deref()),
                    now,
                );
            }
            JobUpdate::ReviewRequested {
                phase,
                step,
                output,
                reply,
            } => {
                reg.push_event(
                    id,
                    Event::review_requested(&phase, &step, output.clone()),
                    now,
                );
                reg.reviews.insert(
                    id.clone(),
                    PendingReview {
                        request: ReviewRequest {
                            phase,
                            step,
                            output,
                        },
                        reply,
                    },
                );
            }
        }
    }
    write_log_lines(lines);
}

fn finalize<C: Clock>(shared: &Shared<C>, id: &JobId, flag: &CancelFlag, outcome: Outcome) {
    let now = shared.now_ms();
    let mut lines = Vec::new();
    {
        let mut reg = shared.registry.lock();
        reg.release_task(id, flag);
        reg.reviews.remove(id);

        let Some(status) = reg.jobs.get(id).map(|entry| entry.job.status) else {
            return;
        };

        match outcome {
            Outcome::Abandoned => {
                tracing::info!(job_id = %id, %status, "job stopped");
            }
            Outcome::Finished(Ok(result)) => {
                if let Some(entry) = reg.jobs.get_mut(id) {
                    entry.job.result = Some(result);
                }
                reg.set_status(id, JobStatus::Completed, now);
                lines.extend(reg.set_progress(id, "Cycle completed successfully", now));
                tracing::info!(job_id = %id, "job completed");
            }
            Outcome::Finished(Err(e)) => match e.interruption() {
                Some(reason) if status == JobStatus::Paused => {
                    tracing::info!(job_id = %id, %reason, "job paused");
                }
                Some(CancelReason::Pause) => {
                    let position = reg
                        .jobs
                        .get(id)
                        .map(|entry| entry.job.position())
                        .unwrap_or_default();
                    reg.set_status(id, JobStatus::Paused, now);
                    lines.extend(reg.set_progress(id, &format!("Paused at {position}"), now));
                    tracing::info!(job_id = %id, "job paused");
                }
                Some(reason) => {
                    if status != JobStatus::Cancelled {
                        reg.set_status(id, JobStatus::Cancelled, now);
                        lines.extend(reg.set_progress(id, "Job cancelled", now));
                    }
                    tracing::info!(job_id = %id, %reason, "job cancelled");
                }
                None => {
                    let message = e.to_string();
                    if let Some(step) = e.failed_step() {
                        let phase = reg.jobs.get(id).and_then(|entry| entry.job.current_phase.clone());
                        tracing::warn!(job_id = %id, phase = phase.as_deref().unwrap_or("-"), step, "step failed");
                        reg.push_event(id, Event::step_failed(phase.as_deref(), step, &message), now);
                    }
                    fail(&mut reg, id, &message, now, &mut lines);
                }
            },
            Outcome::Panicked(message) => {
                fail(&mut reg, id, &format!("worker panicked: {message}"), now, &mut lines);
            }
        }
    }
    write_log_lines(lines);
}

fn fail(
    reg: &mut Registry,
    id: &JobId,
    message: &str,
    now: u64,
    lines: &mut Vec<LogLine>,
) {
    if let Some(entry) = reg.jobs.get_mut(id) {
        entry.job.error = Some(message.to_string());
    }
    reg.set_status(id, JobStatus::Failed, now);
    lines.extend(reg.set_progress(id, &format!("Job failed: {message}"), now));
    tracing::error!(job_id = %id, error = message, "job failed");
}
