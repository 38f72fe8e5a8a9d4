// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.
//!
//! Every function returns `None` when the variable is unset or unparsable;
//! [`crate::Config`] decides the defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigError;

/// Resolve state directory: CE_STATE_DIR > XDG_STATE_HOME/ce > ~/.local/state/ce
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = non_empty("CE_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = non_empty("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("ce"));
    }
    let home = dirs::home_dir().ok_or(ConfigError::NoStateDir)?;
    Ok(home.join(".local/state/ce"))
}

/// Explicit config file path
pub fn config_path() -> Option<PathBuf> {
    non_empty("CE_CONFIG").map(PathBuf::from)
}

/// Directory holding one working directory per job
pub fn sandbox_dir() -> Option<PathBuf> {
    non_empty("CE_SANDBOX_DIR").map(PathBuf::from)
}

/// How long a worker waits for room in the relay channel before dropping an update.
pub fn relay_timeout() -> Option<Duration> {
    millis("CE_RELAY_TIMEOUT_MS")
}

/// Age after which finished jobs are evicted from memory.
pub fn retention() -> Option<Duration> {
    parse_u64("CE_RETENTION_HOURS").map(|h| Duration::from_secs(h * 3600))
}

pub fn cleanup_interval() -> Option<Duration> {
    parse_u64("CE_CLEANUP_INTERVAL_SECS").map(Duration::from_secs)
}

/// Directories a purge may delete working directories from, as a PATH-style list.
pub fn purge_bases() -> Option<Vec<PathBuf>> {
    let raw = std::env::var_os("CE_PURGE_BASES")?;
    let bases: Vec<PathBuf> = std::env::split_paths(&raw)
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    (!bases.is_empty()).then_some(bases)
}

/// Default `mode` of streamed partial output (`delta` or `full`).
pub fn partial_mode() -> Option<String> {
    non_empty("CE_PARTIAL_MODE")
}

/// How often a worker waiting for a review re-checks its cancellation flag.
pub fn review_poll() -> Option<Duration> {
    millis("CE_REVIEW_POLL_MS")
}

/// Shutdown drain timeout (default 5s, configurable via `CE_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Option<Duration> {
    millis("CE_DRAIN_TIMEOUT_MS")
}

pub fn log_file() -> Option<PathBuf> {
    non_empty("CE_LOG_FILE").map(PathBuf::from)
}

/// Tracing filter directives: CE_LOG > RUST_LOG > `info`
pub fn log_filter() -> String {
    non_empty("CE_LOG")
        .or_else(|| non_empty("RUST_LOG"))
        .unwrap_or_else(|| "info".to_string())
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn parse_u64(key: &str) -> Option<u64> {
    non_empty(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn millis(key: &str) -> Option<Duration> {
    parse_u64(key).map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
