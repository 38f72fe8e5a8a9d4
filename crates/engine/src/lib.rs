// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ce-engine: resumable step execution for chaos cycle phases

mod budget;
mod hooks;
mod pipeline;
mod runner;
mod step;
mod stream;

pub use budget::RetryBudget;
pub use hooks::{AutoApprove, StepHooks};
pub use pipeline::{
    phase_label, PhasePlan, Pipeline, PipelineContext, PipelineError, PipelineFactory,
    PipelineInput,
};
pub use runner::{RunError, RunOptions, Runner, DEFAULT_FEEDBACK_KEY};
pub use step::{Step, StepError, StepFn, StepInputs, StepOutputs};
pub use stream::{EventSink, NullSink, Role, StreamLogger};
