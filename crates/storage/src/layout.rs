// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File layout of a job working directory.
//!
//! ```text
//! <sandbox>/cycle_20260130_081409_ab12cd/
//!   job_info.json                    job record
//!   checkpoints/step_checkpoint.json step-level checkpoint document
//!   outputs/output.json              coarse per-phase snapshot
//!   logs/job.log                     activity log
//! ```

use ce_core::JobId;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub const JOB_RECORD_FILE: &str = "job_info.json";

pub fn job_record_path(work_dir: &Path) -> PathBuf {
    work_dir.join(JOB_RECORD_FILE)
}

pub fn checkpoint_path(work_dir: &Path) -> PathBuf {
    work_dir.join("checkpoints").join("step_checkpoint.json")
}

pub fn output_snapshot_path(work_dir: &Path) -> PathBuf {
    work_dir.join("outputs").join("output.json")
}

pub fn job_log_path(work_dir: &Path) -> PathBuf {
    work_dir.join("logs").join("job.log")
}

/// Directory name for a new cycle, unique per job.
pub fn cycle_dir_name(created_at: DateTime<Utc>, job_id: &JobId) -> String {
    format!(
        "cycle_{}_{}",
        created_at.format("%Y%m%d_%H%M%S"),
        job_id.short(6)
    )
}

/// `2026-01-30T08:14:09Z`
pub fn format_utc(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
