// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job manager configuration: defaults, optional TOML file, env overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::env;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not determine state directory (set CE_STATE_DIR or HOME)")]
    NoStateDir,
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Values accepted in `config.toml`. Everything is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub sandbox_dir: Option<PathBuf>,
    pub relay_timeout_ms: Option<u64>,
    pub retention_hours: Option<u64>,
    pub cleanup_interval_secs: Option<u64>,
    pub purge_bases: Option<Vec<PathBuf>>,
    pub partial_mode: Option<String>,
    pub review_poll_ms: Option<u64>,
    pub drain_timeout_ms: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/ce)
    pub state_dir: PathBuf,
    /// Parent of every job working directory
    pub sandbox_dir: PathBuf,
    pub relay_timeout: Duration,
    pub retention: Duration,
    pub cleanup_interval: Duration,
    /// Purge only deletes directories strictly inside one of these
    pub purge_bases: Vec<PathBuf>,
    /// Default `mode` field of partial-output events
    pub partial_mode: String,
    pub review_poll: Duration,
    pub drain_timeout: Duration,
    /// Daemon log file; stderr when unset
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub const PARTIAL_MODES: [&'static str; 2] = ["delta", "full"];

    /// Defaults rooted at `state_dir`, without reading files or env.
    pub fn for_state_dir(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        let sandbox_dir = state_dir.join("sandbox");
        Self {
            purge_bases: vec![sandbox_dir.clone()],
            sandbox_dir,
            relay_timeout: Duration::from_secs(5),
            retention: Duration::from_secs(24 * 3600),
            cleanup_interval: Duration::from_secs(3600),
            partial_mode: "delta".to_string(),
            review_poll: Duration::from_millis(200),
            drain_timeout: Duration::from_secs(5),
            log_file: None,
            state_dir,
        }
    }

    /// Load configuration for the current user.
    ///
    /// Reads `$CE_CONFIG` (or `{state_dir}/config.toml` when present), then
    /// applies `CE_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = env::state_dir()?;
        let path = env::config_path().unwrap_or_else(|| state_dir.join("config.toml"));
        let file = ConfigFile::read(&path)?.unwrap_or_default();
        let config = Self::for_state_dir(state_dir)
            .merge_file(file)
            .merge_env();
        config.validate()?;
        Ok(config)
    }

    pub fn merge_file(mut self, file: ConfigFile) -> Self {
        if let Some(dir) = file.sandbox_dir {
            self.set_sandbox_dir(dir);
        }
        if let Some(ms) = file.relay_timeout_ms {
            self.relay_timeout = Duration::from_millis(ms);
        }
        if let Some(hours) = file.retention_hours {
            self.retention = Duration::from_secs(hours * 3600);
        }
        if let Some(secs) = file.cleanup_interval_secs {
            self.cleanup_interval = Duration::from_secs(secs);
        }
        if let Some(bases) = file.purge_bases {
            self.purge_bases = bases;
        }
        if let Some(mode) = file.partial_mode {
            self.partial_mode = mode;
        }
        if let Some(ms) = file.review_poll_ms {
            self.review_poll = Duration::from_millis(ms);
        }
        if let Some(ms) = file.drain_timeout_ms {
            self.drain_timeout = Duration::from_millis(ms);
        }
        if file.log_file.is_some() {
            self.log_file = file.log_file;
        }
        self
    }

    pub fn merge_env(mut self) -> Self {
        if let Some(dir) = env::sandbox_dir() {
            self.set_sandbox_dir(dir);
        }
        if let Some(timeout) = env::relay_timeout() {
            self.relay_timeout = timeout;
        }
        if let Some(retention) = env::retention() {
            self.retention = retention;
        }
        if let Some(interval) = env::cleanup_interval() {
            self.cleanup_interval = interval;
        }
        if let Some(bases) = env::purge_bases() {
            self.purge_bases = bases;
        }
        if let Some(mode) = env::partial_mode() {
            self.partial_mode = mode;
        }
        if let Some(poll) = env::review_poll() {
            self.review_poll = poll;
        }
        if let Some(drain) = env::drain_timeout() {
            self.drain_timeout = drain;
        }
        if let Some(log_file) = env::log_file() {
            self.log_file = Some(log_file);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !Self::PARTIAL_MODES.contains(&self.partial_mode.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "partial_mode '{}' must be one of: {}",
                self.partial_mode,
                Self::PARTIAL_MODES.join(", ")
            )));
        }
        if self.purge_bases.is_empty() {
            return Err(ConfigError::Invalid("purge_bases cannot be empty".into()));
        }
        if self.review_poll.is_zero() {
            return Err(ConfigError::Invalid("review_poll_ms cannot be 0".into()));
        }
        Ok(())
    }

    /// Move the sandbox; purge bases that tracked the old sandbox follow it.
    fn set_sandbox_dir(&mut self, dir: PathBuf) {
        for base in &mut self.purge_bases {
            if *base == self.sandbox_dir {
                *base = dir.clone();
            }
        }
        self.sandbox_dir = dir;
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
