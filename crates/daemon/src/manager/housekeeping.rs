// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifetime outside a single run: purge, retention, restart recovery
//! and shutdown.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ce_core::{Clock, Event, Job, JobId, JobStatus, PhaseOrder};
use ce_storage::{resolve_resume, scan_job_records, ResumeSource};
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;

use super::{JobEntry, JobManager, JobSpec, ManagerError};

/// What happened to a purged job's working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRemoval {
    /// Files were left in place.
    Skipped,
    Deleted,
    /// The directory was already gone.
    NotFound,
}

ce_core::simple_display! {
    FileRemoval {
        Skipped => "skipped",
        Deleted => "deleted",
        NotFound => "not found",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub job_id: JobId,
    pub work_dir: PathBuf,
    pub files: FileRemoval,
}

/// Progress line of a job rebuilt from disk that still has phases to run.
pub const RECOVERED_MESSAGE: &str = "Recovered after restart";

impl<C: Clock> JobManager<C> {
    /// Forget a job, optionally deleting its working directory.
    ///
    /// The directory is only deleted when it resolves strictly inside one of
    /// the configured purge bases; otherwise nothing is removed at all.
    pub fn purge(&self, id: &JobId, remove_files: bool) -> Result<PurgeReport, ManagerError> {
        let work_dir = {
            let reg = self.shared.registry.lock();
            let job = &reg.entry(id)?.job;
            if job.status.is_active() {
                return Err(ManagerError::Conflict {
                    id: id.clone(),
                    status: job.status,
                    action: "purge",
                });
            }
            job.work_dir.clone()
        };

        let files = if !remove_files {
            FileRemoval::Skipped
        } else {
            match work_dir.canonicalize() {
                Ok(resolved) => {
                    if !self.is_purgeable(&resolved) {
                        tracing::warn!(job_id = %id, path = %resolved.display(), "refusing to purge outside allowed bases");
                        return Err(ManagerError::OutsideAllowedBase(resolved));
                    }
                    std::fs::remove_dir_all(&resolved)?;
                    FileRemoval::Deleted
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileRemoval::NotFound,
                Err(e) => return Err(e.into()),
            }
        };

        self.shared.registry.lock().forget(id);
        tracing::info!(job_id = %id, %files, "job purged");
        Ok(PurgeReport {
            job_id: id.clone(),
            work_dir,
            files,
        })
    }

    fn is_purgeable(&self, resolved: &Path) -> bool {
        self.shared.config.purge_bases.iter().any(|base| {
            base.canonicalize()
                .map(|base| resolved != base && resolved.starts_with(&base))
                .unwrap_or(false)
        })
    }

    /// Evict finished jobs not updated within `retention`. Returns how many.
    ///
    /// Only Completed, Failed and Cancelled jobs are evicted; their working
    /// directories stay on disk.
    pub fn cleanup_old_jobs(&self, retention: Duration) -> usize {
        let cutoff = self
            .shared
            .now_ms()
            .saturating_sub(retention.as_millis() as u64);
        let mut reg = self.shared.registry.lock();
        let stale: Vec<JobId> = reg
            .jobs
            .values()
            .filter(|entry| entry.job.is_terminal() && entry.job.updated_at_ms < cutoff)
            .map(|entry| entry.job.id.clone())
            .collect();
        for id in &stale {
            reg.forget(id);
        }
        if !stale.is_empty() {
            tracing::info!(count = stale.len(), "evicted old jobs");
        }
        stale.len()
    }

    /// Run [`cleanup_old_jobs`](Self::cleanup_old_jobs) every
    /// `cleanup_interval` until [`shutdown`](Self::shutdown).
    pub fn spawn_retention_sweeper(&self) -> JoinHandle<()> {
        let manager = self.clone();
        let shutdown = self.shared.shutdown.clone();
        let every = self.shared.config.cleanup_interval;
        let retention = self.shared.config.retention;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        manager.cleanup_old_jobs(retention);
                    }
                }
            }
            tracing::debug!("retention sweeper stopped");
        })
    }

    /// Rebuild jobs from `job_info.json` records in the sandbox.
    ///
    /// Jobs already known are left alone. A job whose every phase has output
    /// comes back Completed; anything else comes back Paused at the point
    /// `resume` would continue from. Returns how many jobs were added.
    pub fn recover(&self) -> usize {
        let sandbox = &self.shared.config.sandbox_dir;
        let mut added = 0;

        for found in scan_job_records(sandbox) {
            let id = found.record.job_id.clone();
            if self.shared.registry.lock().jobs.contains_key(&id) {
                continue;
            }

            let spec = JobSpec::new(found.record.original_request.clone());
            let order = self.phases_for(&spec.request);
            let plan = resolve_resume(&found.work_dir, &order);
            let now = self.shared.now_ms();
            let created_at_ms = u64::try_from(found.record.created_at.timestamp_millis()).unwrap_or(now);

            let mut job = Job::new(id.clone(), found.work_dir.clone(), &self.shared.clock);
            job.created_at_ms = created_at_ms;
            let message = if plan.source == ResumeSource::Finished {
                job.status = JobStatus::Completed;
                job.result = plan
                    .snapshot
                    .as_ref()
                    .map(|s| Value::Object(s.outputs.clone().into_iter().collect()));
                "All phases already completed"
            } else {
                job.status = JobStatus::Paused;
                if let Some(point) = &plan.point {
                    job.current_phase = Some(point.phase.clone());
                    job.current_step = point.step.clone();
                }
                RECOVERED_MESSAGE
            };
            job.set_progress(message, now);
            let status = job.status;

            {
                let mut reg = self.shared.registry.lock();
                reg.jobs.insert(id.clone(), JobEntry { job, spec });
                reg.push_event(&id, Event::status(status), now);
                reg.push_event(&id, Event::progress(message), now);
            }
            tracing::info!(job_id = %id, %status, source = %plan.source, "recovered job");
            added += 1;
        }

        added
    }

    fn phases_for(&self, request: &Value) -> PhaseOrder {
        match self.shared.factory.build(request) {
            Ok(pipeline) => pipeline.phases(),
            Err(e) => {
                tracing::warn!(error = %e, "cannot build pipeline for recovered job, using default phases");
                PhaseOrder::default()
            }
        }
    }

    /// Wait for the job's coordinator, if one is running, to finish.
    pub async fn join(&self, id: &JobId) {
        let handle = self
            .shared
            .registry
            .lock()
            .tasks
            .get_mut(id)
            .and_then(|task| task.join.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(job_id = %id, error = %e, "coordinator task failed");
            }
        }
    }

    /// Pause every active job and wait up to `drain` for coordinators to exit.
    ///
    /// Stops the retention sweeper. Returns the ids that were paused.
    pub async fn shutdown(&self, drain: Duration) -> Vec<JobId> {
        self.shared.shutdown.cancel();

        let active: Vec<JobId> = self
            .shared
            .registry
            .lock()
            .jobs
            .values()
            .filter(|entry| entry.job.status.is_active())
            .map(|entry| entry.job.id.clone())
            .collect();

        let mut paused = Vec::new();
        for id in active {
            match self.pause(&id) {
                Ok(()) => paused.push(id),
                Err(e) => tracing::debug!(job_id = %id, error = %e, "job not paused at shutdown"),
            }
        }

        let handles: Vec<(JobId, JoinHandle<()>)> = {
            let mut reg = self.shared.registry.lock();
            reg.tasks
                .iter_mut()
                .filter_map(|(id, task)| task.join.take().map(|h| (id.clone(), h)))
                .collect()
        };

        let drained = tokio::time::timeout(drain, async {
            for (id, handle) in handles {
                if let Err(e) = handle.await {
                    tracing::warn!(job_id = %id, error = %e, "coordinator task failed");
                }
            }
        })
        .await;
        if drained.is_err() {
            tracing::warn!(drain_ms = drain.as_millis() as u64, "shutdown drain timed out");
        }
        tracing::info!(paused = paused.len(), "job manager stopped");
        paused
    }
}

#[cfg(test)]
#[path = "housekeeping_tests.rs"]
mod tests;
