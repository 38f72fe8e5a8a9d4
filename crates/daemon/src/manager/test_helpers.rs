// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake cycle pipeline and manager fixtures shared by the manager tests.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ce_core::{FakeClock, JobId, JobStatus, PhaseOrder, StepDecision};
use ce_engine::{
    PhasePlan, Pipeline, PipelineContext, PipelineError, PipelineFactory, PipelineInput, Step,
    StepError,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;

use super::JobManager;
use crate::config::Config;

pub(super) type Calls = Arc<Mutex<Vec<String>>>;

/// How a fake step behaves.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Fault {
    Fail(&'static str),
    Panic,
}

/// Default seven-phase cycle. Every phase has a single `run` step except
/// hypothesis, which runs `inspect`, `draft_agent_0` and `draft_agent_1`.
pub(super) struct FakeCycle {
    calls: Calls,
    faults: Vec<(String, Fault)>,
}

pub(super) fn steps_of(phase: &str) -> Vec<&'static str> {
    match phase {
        "hypothesis" => vec!["inspect", "draft_agent_0", "draft_agent_1"],
        _ => vec!["run"],
    }
}

impl FakeCycle {
    fn step(&self, phase: &str, name: &'static str) -> Step {
        let calls = Arc::clone(&self.calls);
        let label = format!("{phase}/{name}");
        let fault = self
            .faults
            .iter()
            .find(|(at, _)| *at == label)
            .map(|(_, f)| f.clone());
        Step::new(name, name, move |_| {
            calls.lock().push(label.clone());
            match &fault {
                Some(Fault::Fail(message)) => Err(StepError::failed(*message)),
                Some(Fault::Panic) => panic!("step {label} exploded"),
                None => Ok(format!("{label} done")),
            }
        })
    }
}

impl Pipeline for FakeCycle {
    fn run(
        &mut self,
        ctx: &mut dyn PipelineContext,
        input: PipelineInput,
    ) -> Result<Value, PipelineError> {
        let order = self.phases();
        let mut plan = PhasePlan::new(order.clone(), &input);
        let mut outputs = serde_json::Map::new();
        for phase in order.phases() {
            let mut runner = plan.runner(phase);
            for name in steps_of(phase) {
                runner = runner.add_step(self.step(phase, name));
            }
            let output = plan.run_phase(ctx, phase, |ctx, options| {
                let out = runner.run(ctx.hooks(), options)?;
                Ok(Value::Object(out.into_iter().collect()))
            })?;
            outputs.insert(phase.clone(), output);
        }
        Ok(Value::Object(outputs))
    }
}

/// Factory for [`FakeCycle`] that records every executed `phase/step`.
#[derive(Clone, Default)]
pub(super) struct FakeFactory {
    pub(super) calls: Calls,
    faults: Arc<Mutex<Vec<(String, Fault)>>>,
}

impl FakeFactory {
    pub(super) fn fault_at(&self, step: &str, fault: Fault) {
        self.faults.lock().push((step.to_string(), fault));
    }

    pub(super) fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub(super) fn reset_calls(&self) {
        self.calls.lock().clear();
    }
}

impl PipelineFactory for FakeFactory {
    fn build(&self, request: &Value) -> Result<Box<dyn Pipeline>, PipelineError> {
        if request.get("invalid").is_some() {
            return Err(PipelineError::Build("request has no target".to_string()));
        }
        Ok(Box::new(FakeCycle {
            calls: Arc::clone(&self.calls),
            faults: self.faults.lock().clone(),
        }))
    }
}

pub(super) struct Fixture {
    pub(super) manager: JobManager<FakeClock>,
    pub(super) factory: FakeFactory,
    pub(super) clock: FakeClock,
    pub(super) dir: TempDir,
}

pub(super) fn test_config(state_dir: &Path) -> Config {
    let mut config = Config::for_state_dir(state_dir.to_path_buf());
    config.review_poll = Duration::from_millis(10);
    config.relay_timeout = Duration::from_millis(500);
    config.drain_timeout = Duration::from_secs(2);
    config
}

pub(super) fn fixture() -> Fixture {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => panic!("tempdir: {e}"),
    };
    fixture_in(dir)
}

pub(super) fn fixture_in(dir: TempDir) -> Fixture {
    let factory = FakeFactory::default();
    let clock = FakeClock::new();
    let manager = JobManager::with_clock(
        test_config(dir.path()),
        Arc::new(factory.clone()),
        clock.clone(),
    );
    Fixture {
        manager,
        factory,
        clock,
        dir,
    }
}

pub(super) fn request() -> Value {
    json!({ "instructions": "keep the front page up", "target": "sock-shop" })
}

pub(super) fn all_steps() -> Vec<String> {
    PhaseOrder::default()
        .phases()
        .iter()
        .flat_map(|phase| {
            steps_of(phase)
                .into_iter()
                .map(move |step| format!("{phase}/{step}"))
        })
        .collect()
}

/// Poll `check` until it holds, failing the test after two seconds.
pub(super) async fn eventually<F>(what: &str, mut check: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}

pub(super) async fn wait_for_status(manager: &JobManager<FakeClock>, id: &JobId, status: JobStatus) {
    eventually(&format!("{id} to be {status}"), || {
        manager.get_job(id).map(|job| job.status) == Some(status)
    })
    .await;
}

/// Wait until `step` awaits review.
pub(super) async fn wait_for_review(manager: &JobManager<FakeClock>, id: &JobId, step: &str) {
    eventually(&format!("review of {step}"), || {
        manager
            .pending_review(id)
            .is_some_and(|review| review.step == step)
    })
    .await;
}

/// Approve reviews until `step` is the one waiting.
pub(super) async fn approve_until(manager: &JobManager<FakeClock>, id: &JobId, step: &str) {
    loop {
        eventually("a pending review", || manager.pending_review(id).is_some()).await;
        let Some(review) = manager.pending_review(id) else {
            continue;
        };
        if review.step == step {
            return;
        }
        if let Err(e) = manager.submit_review(id, StepDecision::approve()) {
            panic!("approve {}: {e}", review.step);
        }
    }
}

/// Approve every review until the job leaves Running.
pub(super) async fn approve_all(manager: &JobManager<FakeClock>, id: &JobId) {
    loop {
        let status = manager.get_job(id).map(|job| job.status);
        if status.is_some_and(|s| !s.is_active()) {
            return;
        }
        if manager.pending_review(id).is_some() {
            let _ = manager.submit_review(id, StepDecision::approve());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Run `fut` with a deadline so a stuck job fails the test instead of hanging.
pub(super) async fn within<T>(fut: impl Future<Output = T>) -> T {
    match tokio::time::timeout(Duration::from_secs(5), fut).await {
        Ok(value) => value,
        Err(_) => panic!("timed out"),
    }
}
