// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resume-point resolution from the files in a working directory.

use crate::checkpoint::CheckpointStore;
use crate::snapshot::OutputSnapshot;
use ce_core::{PhaseOrder, ResumePoint};
use serde::Serialize;
use std::path::Path;

/// Which on-disk state a resume point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeSource {
    /// Step-level checkpoint with a pending step.
    StepCheckpoint,
    /// Step-level checkpoint whose phase finished; resume at the next phase.
    PhaseBoundary,
    /// Coarse output snapshot; resume at the first phase without output.
    OutputSnapshot,
    /// Every phase already has output; nothing left to run.
    Finished,
    /// Nothing usable on disk; start over.
    Fresh,
}

ce_core::simple_display! {
    ResumeSource {
        StepCheckpoint => "step checkpoint",
        PhaseBoundary => "phase boundary",
        OutputSnapshot => "output snapshot",
        Finished => "finished",
        Fresh => "fresh start",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumePlan {
    pub source: ResumeSource,
    /// `None` means start from the first phase.
    pub point: Option<ResumePoint>,
    /// Coarse snapshot, when readable, for restoring earlier phase outputs.
    #[serde(skip)]
    pub snapshot: Option<OutputSnapshot>,
}

impl ResumePlan {
    pub const RESTART_MESSAGE: &'static str = "No checkpoint found, restarting from the beginning";

    /// Progress line announcing this plan.
    pub fn progress_message(&self) -> String {
        match (self.source, &self.point) {
            (ResumeSource::Finished, _) => "All phases already completed".to_string(),
            (source, Some(point)) => format!("Resuming from {point} ({source})"),
            (_, None) => Self::RESTART_MESSAGE.to_string(),
        }
    }
}

/// Decide where a resumed job continues.
///
/// The step-level checkpoint always wins when it names a current phase; the
/// coarse snapshot is consulted only when that document is absent,
/// unreadable, or has no usable position:
///
/// 1. current phase with a `next_step` → that phase at that step
/// 2. current phase finished → the next phase from its first step, or
///    nothing left when it was the last phase
/// 3. snapshot → first phase without recorded output
/// 4. otherwise → from the beginning
pub fn resolve_resume(work_dir: &Path, order: &PhaseOrder) -> ResumePlan {
    let snapshot = match OutputSnapshot::load_from_work_dir(work_dir) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(work_dir = %work_dir.display(), error = %e, "ignoring unreadable output snapshot");
            None
        }
    };

    let doc = CheckpointStore::for_work_dir(work_dir).load_document();
    if let Some((phase, Some(checkpoint))) = doc.as_ref().and_then(|d| d.current()) {
        match (&checkpoint.next_step, order.next_after(phase)) {
            (Some(step), _) => {
                return ResumePlan {
                    source: ResumeSource::StepCheckpoint,
                    point: Some(ResumePoint::step(phase, step.clone())),
                    snapshot,
                };
            }
            (None, Some(next_phase)) => {
                return ResumePlan {
                    source: ResumeSource::PhaseBoundary,
                    point: Some(ResumePoint::phase(next_phase)),
                    snapshot,
                };
            }
            (None, None) if order.index_of(phase).is_some() => {
                return ResumePlan {
                    source: ResumeSource::Finished,
                    point: None,
                    snapshot,
                };
            }
            (None, None) => {}
        }
    }

    if let Some(snap) = snapshot {
        return match snap.first_pending(order) {
            Some(phase) => ResumePlan {
                source: ResumeSource::OutputSnapshot,
                point: Some(ResumePoint::phase(phase)),
                snapshot: Some(snap),
            },
            None => ResumePlan {
                source: ResumeSource::Finished,
                point: None,
                snapshot: Some(snap),
            },
        };
    }

    ResumePlan {
        source: ResumeSource::Fresh,
        point: None,
        snapshot: None,
    }
}

#[cfg(test)]
#[path = "resume_tests.rs"]
mod tests;
