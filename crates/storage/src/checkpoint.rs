// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step-level checkpoint document shared by every phase of a job.
//!
//! One JSON document per working directory holds a global summary and one
//! entry per phase:
//!
//! ```json
//! {
//!   "global": {"current_phase": "hypothesis", "last_completed_step": "inspect", "saved_at": "..."},
//!   "phases": {
//!     "hypothesis": {"completed_steps": ["inspect"], "next_step": "draft", "data": {...}}
//!   }
//! }
//! ```
//!
//! Saving a phase rewrites only that phase's entry; other phases, and any
//! keys this version does not know about, are carried over verbatim.

use crate::atomic;
use crate::layout;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Most recent save across all phases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSummary {
    #[serde(default)]
    pub current_phase: Option<String>,
    #[serde(default)]
    pub last_completed_step: Option<String>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Progress of one phase.
///
/// `completed_steps` is a prefix of the phase's step order and `data` holds
/// the outputs of exactly those steps, keyed by output key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseCheckpoint {
    #[serde(default)]
    pub completed_steps: Vec<String>,
    /// `None` once the phase's last step completed.
    #[serde(default)]
    pub next_step: Option<String>,
    #[serde(default)]
    pub data: IndexMap<String, Value>,
    /// Reviewer instructions not yet folded into the instructions artifact,
    /// one per line for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_feedback: Option<String>,
    /// The same messages as entries; what a resumed runner restores.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feedback_backlog: Vec<String>,
}

impl PhaseCheckpoint {
    pub fn is_finished(&self) -> bool {
        self.next_step.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointDocument {
    #[serde(default)]
    pub global: GlobalSummary,
    /// Raw phase entries; kept as JSON so unknown shapes survive a rewrite.
    #[serde(default)]
    pub phases: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CheckpointDocument {
    /// Decode one phase entry. A malformed entry is logged and treated as absent.
    pub fn phase(&self, phase: &str) -> Option<PhaseCheckpoint> {
        let raw = self.phases.get(phase)?;
        match PhaseCheckpoint::deserialize(raw) {
            Ok(checkpoint) => Some(checkpoint),
            Err(e) => {
                tracing::warn!(phase, error = %e, "ignoring malformed phase checkpoint");
                None
            }
        }
    }

    /// Replace one phase entry and point the global summary at it.
    pub fn record(
        &mut self,
        phase: &str,
        checkpoint: &PhaseCheckpoint,
        now: DateTime<Utc>,
    ) -> Result<(), serde_json::Error> {
        self.phases
            .insert(phase.to_string(), serde_json::to_value(checkpoint)?);
        self.global.current_phase = Some(phase.to_string());
        self.global.last_completed_step = checkpoint.completed_steps.last().cloned();
        self.global.saved_at = Some(now);
        Ok(())
    }

    /// Phase named by the global summary, with its decoded entry.
    pub fn current(&self) -> Option<(&str, Option<PhaseCheckpoint>)> {
        let phase = self.global.current_phase.as_deref()?;
        Some((phase, self.phase(phase)))
    }
}

/// Reads and writes the checkpoint document of one working directory.
///
/// Writes are best effort: failures are logged and never reach the caller's
/// control flow, since a lost checkpoint only costs re-running steps.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn for_work_dir(work_dir: &Path) -> Self {
        Self::new(layout::checkpoint_path(work_dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict read: `Ok(None)` when the document does not exist.
    pub fn read_document(&self) -> Result<Option<CheckpointDocument>, CheckpointError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Lenient read: a missing or unreadable document is `None`.
    pub fn load_document(&self) -> Option<CheckpointDocument> {
        match self.read_document() {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unreadable checkpoint document");
                None
            }
        }
    }

    pub fn load(&self, phase: &str) -> Option<PhaseCheckpoint> {
        self.load_document()?.phase(phase)
    }

    /// Persist one phase's checkpoint. Failures are logged and swallowed.
    pub fn save(&self, phase: &str, checkpoint: &PhaseCheckpoint) {
        match self.try_save(phase, checkpoint) {
            Ok(()) => tracing::debug!(
                phase,
                completed = checkpoint.completed_steps.len(),
                next_step = checkpoint.next_step.as_deref().unwrap_or("-"),
                "checkpoint saved"
            ),
            Err(e) => tracing::warn!(
                phase,
                path = %self.path.display(),
                error = %e,
                "failed to save checkpoint"
            ),
        }
    }

    /// Load-modify-write of the shared document.
    ///
    /// A document that exists but does not parse is moved to a rotating
    /// `.bak` and replaced by a fresh one.
    pub fn try_save(
        &self,
        phase: &str,
        checkpoint: &PhaseCheckpoint,
    ) -> Result<(), CheckpointError> {
        let mut doc = match self.read_document() {
            Ok(doc) => doc.unwrap_or_default(),
            Err(CheckpointError::Json(e)) => {
                let bak = atomic::back_up(&self.path)?;
                tracing::warn!(
                    path = %self.path.display(),
                    backup = %bak.display(),
                    error = %e,
                    "corrupt checkpoint document moved aside"
                );
                CheckpointDocument::default()
            }
            Err(e) => return Err(e),
        };
        doc.record(phase, checkpoint, Utc::now())?;
        atomic::write_json(&self.path, &doc)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
