// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::Config;
use crate::env;

/// Build the filter from `CE_LOG` / `RUST_LOG`, falling back to `info` on
/// unparsable directives.
pub fn env_filter() -> EnvFilter {
    let directives = env::log_filter();
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// With a configured log file, output goes through a non-blocking appender
/// and the returned guard must be held until exit to flush it. Otherwise
/// logs go to stderr. A second call is a no-op.
pub fn init_logging(config: &Config) -> std::io::Result<Option<WorkerGuard>> {
    let Some(path) = &config.log_file else {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(env_filter());
        let _ = tracing_subscriber::registry().with(layer).try_init();
        return Ok(None);
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ce.log".into());

    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_target(true)
        .with_thread_names(true)
        .with_filter(env_filter());
    let _ = tracing_subscriber::registry().with(layer).try_init();
    Ok(Some(guard))
}
