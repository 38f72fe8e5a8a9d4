// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error carrying the process exit code.
//!
//! Commands return `ExitError` for outcomes the operator should see as a
//! plain message and a specific code; `main()` does the exiting.

use std::fmt;

/// Nothing matched the given id or path.
pub const NOT_FOUND: i32 = 4;
/// The job exists but its state forbids the action.
pub const CONFLICT: i32 = 3;
/// Bad argument value.
pub const USAGE: i32 = 64;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(NOT_FOUND, message)
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

/// Exit code for an error returned by a command.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ExitError>() {
        Some(e) => e.code,
        None => 1,
    }
}
