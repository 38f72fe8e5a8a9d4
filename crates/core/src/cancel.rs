// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative cancellation shared between the job manager and a worker.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Why a run stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// Operator paused the job; it stays resumable.
    Pause,
    /// Operator cancelled the job.
    Cancel,
    /// A reviewer stopped the run after approving the current step.
    Review,
}

crate::simple_display! {
    CancelReason {
        Pause => "pause",
        Cancel => "cancel",
        Review => "review",
    }
}

impl CancelReason {
    fn code(self) -> u8 {
        match self {
            CancelReason::Pause => 1,
            CancelReason::Cancel => 2,
            CancelReason::Review => 3,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(CancelReason::Pause),
            2 => Some(CancelReason::Cancel),
            3 => Some(CancelReason::Review),
            _ => None,
        }
    }
}

/// Shared, clonable cancellation flag.
///
/// The worker polls it at step boundaries, on every streamed event and while
/// waiting for a review. A later request with a stronger reason (`Cancel`
/// over `Pause`) replaces a weaker one; it never goes back to unset.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicU8>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, reason: CancelReason) {
        self.0.fetch_max(reason.code(), Ordering::SeqCst);
    }

    pub fn reason(&self) -> Option<CancelReason> {
        CancelReason::from_code(self.0.load(Ordering::SeqCst))
    }

    pub fn is_set(&self) -> bool {
        self.reason().is_some()
    }

    /// `Err(reason)` once cancellation was requested.
    pub fn check(&self) -> Result<(), CancelReason> {
        match self.reason() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// Whether both handles point at the same flag.
    pub fn same_as(&self, other: &CancelFlag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
