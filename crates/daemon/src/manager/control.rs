// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator actions on a single job: start, pause, cancel, resume, review.

use ce_core::{CancelReason, Clock, Event, JobId, JobStatus, RetryContext, StepDecision};
use ce_engine::Pipeline;
use ce_storage::{resolve_resume, ResumePlan, ResumeSource};
use serde_json::Value;

use super::{write_log_lines, JobManager, Launch, ManagerError};

impl<C: Clock> JobManager<C> {
    /// Build the job's pipeline and start it from `launch`.
    pub fn start_job(&self, id: &JobId, launch: Launch) -> Result<(), ManagerError> {
        let pipeline = self.build_pipeline(id)?;
        self.launch(id, pipeline, launch)
    }

    /// Stop a Pending or Running job so it can be resumed later.
    ///
    /// The status and `Paused at {position}` line are set before the worker
    /// is told to stop; the worker finishes its current step on its own.
    pub fn pause(&self, id: &JobId) -> Result<(), ManagerError> {
        let now = self.shared.now_ms();
        let line = {
            let mut reg = self.shared.registry.lock();
            let job = &reg.entry(id)?.job;
            if !job.status.is_active() {
                return Err(ManagerError::Conflict {
                    id: id.clone(),
                    status: job.status,
                    action: "pause",
                });
            }
            let message = format!("Paused at {}", job.position());
            reg.set_status(id, JobStatus::Paused, now);
            let line = reg.set_progress(id, &message, now);
            if let Some(task) = reg.tasks.get(id) {
                task.flag.request(CancelReason::Pause);
                task.token.cancel();
            }
            reg.reviews.remove(id);
            line
        };
        tracing::info!(job_id = %id, "job paused");
        write_log_lines(line.into_iter().collect());
        Ok(())
    }

    /// Cancel a job. Cancelling a cancelled job is a no-op.
    pub fn cancel(&self, id: &JobId) -> Result<(), ManagerError> {
        let now = self.shared.now_ms();
        let line = {
            let mut reg = self.shared.registry.lock();
            let status = reg.entry(id)?.job.status;
            match status {
                JobStatus::Cancelled => return Ok(()),
                JobStatus::Completed | JobStatus::Failed => {
                    return Err(ManagerError::Conflict {
                        id: id.clone(),
                        status,
                        action: "cancel",
                    })
                }
                JobStatus::Pending | JobStatus::Running | JobStatus::Paused => {}
            }
            if let Some(task) = reg.tasks.get(id) {
                task.flag.request(CancelReason::Cancel);
                task.token.cancel();
            }
            reg.reviews.remove(id);
            reg.set_status(id, JobStatus::Cancelled, now);
            reg.set_progress(id, "Job cancelled", now)
        };
        tracing::info!(job_id = %id, "job cancelled");
        write_log_lines(line.into_iter().collect());
        Ok(())
    }

    /// Restart a Paused, Cancelled or Failed job from what its working
    /// directory says was done.
    ///
    /// Returns the plan that was followed. When every phase already has
    /// output the job is marked Completed without starting a worker.
    pub fn resume(
        &self,
        id: &JobId,
        retry_context: Option<RetryContext>,
    ) -> Result<ResumePlan, ManagerError> {
        let work_dir = {
            let reg = self.shared.registry.lock();
            let job = &reg.entry(id)?.job;
            if !job.status.is_resumable() {
                return Err(ManagerError::Conflict {
                    id: id.clone(),
                    status: job.status,
                    action: "resume",
                });
            }
            job.work_dir.clone()
        };

        let pipeline = self.build_pipeline(id)?;
        let plan = resolve_resume(&work_dir, &pipeline.phases());
        let message = plan.progress_message();
        tracing::info!(job_id = %id, source = %plan.source, point = ?plan.point, "resuming job");

        let now = self.shared.now_ms();
        let line = {
            let mut reg = self.shared.registry.lock();
            let entry = reg.entry_mut(id)?;
            entry.job.error = None;
            match &plan.point {
                Some(point) => {
                    entry.job.current_phase = Some(point.phase.clone());
                    entry.job.current_step = point.step.clone();
                }
                None => {
                    entry.job.current_phase = None;
                    entry.job.current_step = None;
                }
            }
            if plan.source == ResumeSource::Finished {
                entry.job.result = plan
                    .snapshot
                    .as_ref()
                    .map(|s| Value::Object(s.outputs.clone().into_iter().collect()));
                reg.set_status(id, JobStatus::Completed, now);
            }
            reg.set_progress(id, &message, now)
        };
        write_log_lines(line.into_iter().collect());

        if plan.source != ResumeSource::Finished {
            self.launch(
                id,
                pipeline,
                Launch {
                    resume: plan.point.clone(),
                    snapshot: plan.snapshot.clone(),
                    retry_context,
                },
            )?;
        }
        Ok(plan)
    }

    /// Answer the step waiting for review.
    pub fn submit_review(&self, id: &JobId, decision: StepDecision) -> Result<(), ManagerError> {
        let now = self.shared.now_ms();
        let mut reg = self.shared.registry.lock();
        reg.entry(id)?;
        let pending = reg
            .reviews
            .remove(id)
            .ok_or_else(|| ManagerError::NoPendingReview(id.clone()))?;

        let event = Event::new("review_decision")
            .with("phase", pending.request.phase.as_str())
            .with("step", pending.request.step.as_str())
            .with("action", decision.action.to_string());
        reg.push_event(id, event, now);

        if pending.reply.try_send(decision).is_err() {
            tracing::warn!(job_id = %id, step = %pending.request.step, "worker no longer waiting for review");
        }
        Ok(())
    }

    fn build_pipeline(&self, id: &JobId) -> Result<Box<dyn Pipeline>, ManagerError> {
        let request = self.shared.registry.lock().entry(id)?.spec.request.clone();
        self.shared
            .factory
            .build(&request)
            .map_err(|e| ManagerError::Pipeline(e.to_string()))
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
