// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only activity log kept in each working directory.

use crate::layout;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes human-readable timestamped lines to `<work_dir>/logs/job.log`.
///
/// Format: `2026-01-30T08:14:09Z [hypothesis/draft] message`
///
/// Each `append()` opens, writes and closes the file. Failures are logged
/// via tracing and never propagate.
#[derive(Debug, Clone)]
pub struct JobLogger {
    path: PathBuf,
}

impl JobLogger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn for_work_dir(work_dir: &Path) -> Self {
        Self::new(layout::job_log_path(work_dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, scope: &str, message: &str) {
        if let Err(e) = self.write_line(scope, message) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to write job log"
            );
        }
    }

    fn write_line(&self, scope: &str, message: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let ts = layout::format_utc(Utc::now());
        // One prefix per line.
        for line in message.lines() {
            writeln!(file, "{ts} [{scope}] {line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "job_log_tests.rs"]
mod tests;
