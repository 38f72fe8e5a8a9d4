// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ce-daemon: job manager for chaos cycle runs
//!
//! Owns job state, runs pipelines on the blocking pool and bridges their
//! progress back into an event log clients poll with a cursor.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
pub mod event_log;
pub mod logging;
pub mod manager;

pub use config::{Config, ConfigError, ConfigFile};
pub use event_log::EventLog;
pub use logging::init_logging;
pub use manager::{
    FileRemoval, JobManager, JobSpec, Launch, ManagerError, PurgeReport, ReviewMode,
    ReviewRequest,
};
