// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coarse per-phase output snapshot.
//!
//! Written after each completed phase, independent of the step-level
//! checkpoint document. Resume only falls back to it when no step-level
//! document can be read.

use crate::atomic;
use crate::layout;
use ce_core::PhaseOrder;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Current snapshot schema version
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {0} is newer than supported version {CURRENT_SNAPSHOT_VERSION}")]
    TooNew(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSnapshot {
    #[serde(rename = "v", default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
    /// Phases whose output is recorded, in completion order.
    #[serde(default)]
    pub completed_phases: Vec<String>,
    #[serde(default)]
    pub outputs: IndexMap<String, Value>,
    /// Wall time per phase in seconds.
    #[serde(default)]
    pub run_time: IndexMap<String, f64>,
    pub saved_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    CURRENT_SNAPSHOT_VERSION
}

impl OutputSnapshot {
    pub fn new(work_dir: &Path) -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            work_dir: Some(work_dir.to_path_buf()),
            completed_phases: Vec::new(),
            outputs: IndexMap::new(),
            run_time: IndexMap::new(),
            saved_at: Utc::now(),
        }
    }

    pub fn is_complete(&self, phase: &str) -> bool {
        self.completed_phases.iter().any(|p| p == phase)
    }

    pub fn output(&self, phase: &str) -> Option<&Value> {
        self.outputs.get(phase)
    }

    /// Record a finished phase. Re-recording a phase replaces its output.
    pub fn record_phase(&mut self, phase: &str, output: Value, elapsed: Duration) {
        if !self.is_complete(phase) {
            self.completed_phases.push(phase.to_string());
        }
        self.outputs.insert(phase.to_string(), output);
        self.run_time
            .insert(phase.to_string(), elapsed.as_secs_f64());
        self.saved_at = Utc::now();
    }

    /// First phase of `order` with no recorded output.
    pub fn first_pending<'a>(&self, order: &'a PhaseOrder) -> Option<&'a str> {
        order.first_where(|p| !self.is_complete(p))
    }

    pub fn covers(&self, order: &PhaseOrder) -> bool {
        self.first_pending(order).is_none()
    }

    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: Self = serde_json::from_str(&content)?;
        if snapshot.version > CURRENT_SNAPSHOT_VERSION {
            return Err(SnapshotError::TooNew(snapshot.version));
        }
        Ok(Some(snapshot))
    }

    pub fn load_from_work_dir(work_dir: &Path) -> Result<Option<Self>, SnapshotError> {
        Self::load(&layout::output_snapshot_path(work_dir))
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        atomic::write_json(path, self)?;
        Ok(())
    }

    pub fn save_to_work_dir(&self, work_dir: &Path) -> Result<(), SnapshotError> {
        self.save(&layout::output_snapshot_path(work_dir))
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
