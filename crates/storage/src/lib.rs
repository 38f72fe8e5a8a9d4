// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ce-storage: on-disk state of a chaos cycle working directory

mod atomic;
mod checkpoint;
mod job_log;
pub mod layout;
mod record;
mod resume;
mod snapshot;

pub use atomic::write_json;
pub use checkpoint::{
    CheckpointDocument, CheckpointError, CheckpointStore, GlobalSummary, PhaseCheckpoint,
};
pub use job_log::JobLogger;
pub use record::{scan_job_records, FoundRecord, JobRecord, RecordError};
pub use resume::{resolve_resume, ResumePlan, ResumeSource};
pub use snapshot::{OutputSnapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
