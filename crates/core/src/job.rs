// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and lifecycle status.

use crate::clock::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

crate::define_id! {
    /// Identifier of one chaos cycle job.
    pub struct JobId("job-");
}

/// Lifecycle status of a job.
///
/// `Pending` and `Running` are active; `Completed`, `Failed` and `Cancelled`
/// are terminal. `Paused` is neither: the job holds no worker but can be
/// resumed from its checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Whether `resume` may restart a worker for a job in this status.
    pub fn is_resumable(self) -> bool {
        matches!(
            self,
            JobStatus::Paused | JobStatus::Cancelled | JobStatus::Failed
        )
    }
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Paused => "paused",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "paused" => Ok(JobStatus::Paused),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// In-memory record of a job, owned by the job manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    /// Last human-readable progress line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    /// Error text of a failed run, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    /// Working directory holding checkpoints and artifacts.
    pub work_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl Job {
    pub const CREATED: &'static str = "Job created";

    pub fn new(id: JobId, work_dir: PathBuf, clock: &impl Clock) -> Self {
        let now = clock.epoch_ms();
        Self {
            id,
            status: JobStatus::Pending,
            created_at_ms: now,
            updated_at_ms: now,
            progress: Some(Self::CREATED.to_string()),
            error: None,
            current_phase: None,
            current_step: None,
            work_dir,
            result: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn set_status(&mut self, status: JobStatus, now_ms: u64) {
        self.status = status;
        self.updated_at_ms = now_ms;
    }

    pub fn set_progress(&mut self, message: impl Into<String>, now_ms: u64) {
        self.progress = Some(message.into());
        self.updated_at_ms = now_ms;
    }

    /// `phase/step` label of the job's current position.
    pub fn position(&self) -> String {
        match (&self.current_phase, &self.current_step) {
            (Some(phase), Some(step)) => format!("{phase}/{step}"),
            (Some(phase), None) => phase.clone(),
            (None, _) => "start".to_string(),
        }
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            id: JobId = "job-test",
            work_dir: PathBuf = "/tmp/ce/cycle_test",
        }
        set {
            status: JobStatus = JobStatus::Pending,
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
            result: Option<Value> = None,
        }
        option {
            progress: String = None,
            error: String = None,
            current_phase: String = None,
            current_step: String = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
