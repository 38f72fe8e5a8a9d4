// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job manager: registry of chaos cycle jobs and the tasks running them.
//!
//! All job state lives behind one `parking_lot::Mutex` that is never held
//! across an `.await`. Each running job has a coordinator task on the async
//! runtime and a worker on the blocking pool; the worker reports back only
//! through a bounded channel that the coordinator drains into the registry.

mod control;
mod coordinator;
mod housekeeping;
mod worker;

pub use housekeeping::{FileRemoval, PurgeReport};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ce_core::{
    CancelFlag, Clock, Event, Job, JobId, JobStatus, ResumePoint, RetryContext, StepDecision,
    SystemClock,
};
use ce_engine::PipelineFactory;
use ce_storage::{layout, JobLogger, JobRecord, OutputSnapshot};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::event_log::EventLog;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("cannot {action} job {id}: job is {status}")]
    Conflict {
        id: JobId,
        status: JobStatus,
        action: &'static str,
    },
    #[error("refusing to delete {}: outside allowed base directories", .0.display())]
    OutsideAllowedBase(PathBuf),
    #[error("job {0} has no step awaiting review")]
    NoPendingReview(JobId),
    #[error("pipeline error: {0}")]
    Pipeline(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a job's step outputs are reviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewMode {
    /// Every step is approved without waiting.
    #[default]
    Auto,
    /// Each step waits for [`JobManager::submit_review`].
    Interactive,
}

/// What to run: the cycle request plus how to review it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub request: Value,
    #[serde(default)]
    pub review: ReviewMode,
}

impl JobSpec {
    pub fn new(request: Value) -> Self {
        Self {
            request,
            review: ReviewMode::Auto,
        }
    }

    pub fn interactive(mut self) -> Self {
        self.review = ReviewMode::Interactive;
        self
    }
}

/// Where a started job begins.
#[derive(Debug, Clone, Default)]
pub struct Launch {
    pub resume: Option<ResumePoint>,
    pub snapshot: Option<OutputSnapshot>,
    pub retry_context: Option<RetryContext>,
}

/// A step output waiting for a reviewer's decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRequest {
    pub phase: String,
    pub step: String,
    pub output: Value,
}

struct JobEntry {
    job: Job,
    spec: JobSpec,
}

struct TaskHandle {
    flag: CancelFlag,
    token: CancellationToken,
    join: Option<JoinHandle<()>>,
}

struct PendingReview {
    request: ReviewRequest,
    reply: std::sync::mpsc::SyncSender<StepDecision>,
}

#[derive(Default)]
struct Registry {
    jobs: HashMap<JobId, JobEntry>,
    events: HashMap<JobId, EventLog>,
    tasks: HashMap<JobId, TaskHandle>,
    reviews: HashMap<JobId, PendingReview>,
}

/// A line for a job's activity log, written after the registry lock is released.
struct LogLine {
    work_dir: PathBuf,
    scope: String,
    message: String,
}

impl LogLine {
    fn new(work_dir: &Path, scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            scope: scope.into(),
            message: message.into(),
        }
    }
}

fn write_log_lines(lines: Vec<LogLine>) {
    for line in lines {
        JobLogger::for_work_dir(&line.work_dir).append(&line.scope, &line.message);
    }
}

impl Registry {
    fn entry(&self, id: &JobId) -> Result<&JobEntry, ManagerError> {
        self.jobs
            .get(id)
            .ok_or_else(|| ManagerError::NotFound(id.clone()))
    }

    fn entry_mut(&mut self, id: &JobId) -> Result<&mut JobEntry, ManagerError> {
        self.jobs
            .get_mut(id)
            .ok_or_else(|| ManagerError::NotFound(id.clone()))
    }

    fn push_event(&mut self, id: &JobId, event: Event, now_ms: u64) -> usize {
        self.events.entry(id.clone()).or_default().push(event, now_ms)
    }

    /// Set the progress line and append the matching event.
    fn set_progress(&mut self, id: &JobId, message: &str, now_ms: u64) -> Option<LogLine> {
        let entry = self.jobs.get_mut(id)?;
        entry.job.set_progress(message, now_ms);
        let line = LogLine::new(&entry.job.work_dir, "job", message);
        self.push_event(id, Event::progress(message), now_ms);
        Some(line)
    }

    fn set_status(&mut self, id: &JobId, status: JobStatus, now_ms: u64) {
        if let Some(entry) = self.jobs.get_mut(id) {
            entry.job.set_status(status, now_ms);
            self.push_event(id, Event::status(status), now_ms);
        }
    }

    /// Drop the task handle, but only if it still belongs to `flag`'s run.
    fn release_task(&mut self, id: &JobId, flag: &CancelFlag) {
        if self
            .tasks
            .get(id)
            .is_some_and(|task| task.flag.same_as(flag))
        {
            self.tasks.remove(id);
        }
    }

    fn forget(&mut self, id: &JobId) -> Option<JobEntry> {
        self.events.remove(id);
        self.tasks.remove(id);
        self.reviews.remove(id);
        self.jobs.remove(id)
    }
}

struct Shared<C: Clock> {
    config: Config,
    factory: Arc<dyn PipelineFactory>,
    clock: C,
    registry: Mutex<Registry>,
    shutdown: CancellationToken,
}

impl<C: Clock> Shared<C> {
    fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms() as i64).unwrap_or_else(Utc::now)
    }
}

/// Owns every job of one process. Cheap to clone; clones share state.
pub struct JobManager<C: Clock = SystemClock> {
    shared: Arc<Shared<C>>,
}

impl<C: Clock> Clone for JobManager<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl JobManager<SystemClock> {
    pub fn new(config: Config, factory: Arc<dyn PipelineFactory>) -> Self {
        Self::with_clock(config, factory, SystemClock)
    }
}

impl<C: Clock> JobManager<C> {
    pub fn with_clock(config: Config, factory: Arc<dyn PipelineFactory>, clock: C) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                factory,
                clock,
                registry: Mutex::new(Registry::default()),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Register a Pending job and create its working directory.
    ///
    /// The directory is `{sandbox}/cycle_{utc}_{id suffix}`. Failing to write
    /// `job_info.json` is logged; the job then only lives until restart.
    pub fn create_job(&self, spec: JobSpec) -> Result<JobId, ManagerError> {
        let shared = &self.shared;
        let id = JobId::new();
        let created_at = shared.now_utc();
        let work_dir = shared
            .config
            .sandbox_dir
            .join(layout::cycle_dir_name(created_at, &id));
        std::fs::create_dir_all(&work_dir)?;

        let record = JobRecord::new(id.clone(), spec.request.clone(), created_at);
        if let Err(e) = record.write(&work_dir) {
            tracing::warn!(job_id = %id, error = %e, "failed to write job record");
        }

        let job = Job::new(id.clone(), work_dir.clone(), &shared.clock);
        let now = job.created_at_ms;
        {
            let mut reg = shared.registry.lock();
            reg.jobs.insert(id.clone(), JobEntry { job, spec });
            reg.push_event(&id, Event::status(JobStatus::Pending), now);
            reg.push_event(&id, Event::progress(Job::CREATED), now);
        }
        JobLogger::for_work_dir(&work_dir).append("job", Job::CREATED);
        tracing::info!(job_id = %id, work_dir = %work_dir.display(), "job created");
        Ok(id)
    }

    /// Create a job and start it from the beginning.
    pub fn submit(&self, spec: JobSpec) -> Result<JobId, ManagerError> {
        let id = self.create_job(spec)?;
        self.start_job(&id, Launch::default())?;
        Ok(id)
    }

    pub fn get_job(&self, id: &JobId) -> Option<Job> {
        self.shared
            .registry
            .lock()
            .jobs
            .get(id)
            .map(|entry| entry.job.clone())
    }

    /// All jobs, oldest first, optionally filtered by status.
    pub fn list_jobs(&self, status: Option<JobStatus>) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .shared
            .registry
            .lock()
            .jobs
            .values()
            .filter(|entry| status.map_or(true, |s| entry.job.status == s))
            .map(|entry| entry.job.clone())
            .collect();
        jobs.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.id.cmp(&b.id))
        });
        jobs
    }

    /// Append an event to a job's log. Returns the new cursor.
    pub fn push_event(&self, id: &JobId, event: Event) -> Result<usize, ManagerError> {
        let now = self.shared.now_ms();
        let mut reg = self.shared.registry.lock();
        reg.entry(id)?;
        Ok(reg.push_event(id, event, now))
    }

    /// Events after `cursor` and the cursor to pass next time.
    ///
    /// An unknown job has no events.
    pub fn events_since(&self, id: &JobId, cursor: usize) -> (Vec<Event>, usize) {
        match self.shared.registry.lock().events.get(id) {
            Some(log) => log.since(cursor),
            None => (Vec::new(), 0),
        }
    }

    /// The step currently waiting for a reviewer, if any.
    pub fn pending_review(&self, id: &JobId) -> Option<ReviewRequest> {
        self.shared
            .registry
            .lock()
            .reviews
            .get(id)
            .map(|pending| pending.request.clone())
    }
}

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
