// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ce-core: shared vocabulary of the chaos cycle engine

pub mod macros;

pub mod cancel;
pub mod clock;
pub mod event;
pub mod id;
pub mod job;
pub mod phase;
pub mod review;
pub mod value;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use cancel::{CancelFlag, CancelReason};
pub use clock::{Clock, FakeClock, SystemClock};
pub use event::Event;
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{Job, JobId, JobStatus};
pub use phase::{PhaseOrder, ResumePoint, CYCLE_PHASES};
pub use review::{RetryContext, RetryEntry, StepAction, StepDecision};
pub use value::{from_plain, Serializable};
