// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `job_info.json`: the minimal record needed to rebuild a job after restart.
//!
//! Written once at job creation. On startup the sandbox is scanned for these
//! files and every job found is re-registered from its record plus whatever
//! checkpoint state sits next to it.

use crate::atomic;
use crate::layout;
use ce_core::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    /// The request the job was created with, as submitted.
    pub original_request: Value,
    pub created_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(job_id: JobId, original_request: Value, created_at: DateTime<Utc>) -> Self {
        Self {
            job_id,
            original_request,
            created_at,
        }
    }

    pub fn write(&self, work_dir: &Path) -> Result<(), RecordError> {
        atomic::write_json(&layout::job_record_path(work_dir), self)?;
        Ok(())
    }

    pub fn read(work_dir: &Path) -> Result<Self, RecordError> {
        let content = std::fs::read_to_string(layout::job_record_path(work_dir))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// A record found on disk, with the working directory that holds it.
#[derive(Debug, Clone)]
pub struct FoundRecord {
    pub work_dir: PathBuf,
    pub record: JobRecord,
}

/// Scan the immediate subdirectories of `sandbox` for job records.
///
/// Directories without a record are ignored; unreadable records are logged
/// and skipped. Results are sorted by creation time.
pub fn scan_job_records(sandbox: &Path) -> Vec<FoundRecord> {
    let mut found = Vec::new();

    let entries = match std::fs::read_dir(sandbox) {
        Ok(entries) => entries,
        Err(_) => return found,
    };

    for entry in entries.flatten() {
        let work_dir = entry.path();
        if !work_dir.is_dir() || !layout::job_record_path(&work_dir).exists() {
            continue;
        }
        match JobRecord::read(&work_dir) {
            Ok(record) => found.push(FoundRecord { work_dir, record }),
            Err(e) => {
                tracing::warn!(
                    path = %work_dir.display(),
                    error = %e,
                    "skipping unreadable job record"
                );
            }
        }
    }

    found.sort_by(|a, b| a.record.created_at.cmp(&b.record.created_at));
    found
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
