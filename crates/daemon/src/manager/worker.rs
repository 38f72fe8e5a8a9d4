// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker side of the job bridge.
//!
//! [`WorkerContext`] is what a pipeline sees while it runs on the blocking
//! pool. Everything it learns is sent to the coordinator as a [`JobUpdate`]
//! over a bounded channel; a full channel is retried until the relay
//! timeout, then the update is dropped.

use std::sync::mpsc::{sync_channel, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ce_core::{CancelFlag, CancelReason, Event, JobId, StepDecision};
use ce_engine::{EventSink, PipelineContext, StepHooks, StreamLogger};
use ce_storage::PhaseCheckpoint;
use serde_json::Value;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::ReviewMode;
use crate::config::Config;

/// Capacity of the worker → coordinator channel.
pub(super) const RELAY_CAPACITY: usize = 256;

const RELAY_BACKOFF: Duration = Duration::from_millis(5);

/// Something the worker observed, applied to the registry by the coordinator.
pub(super) enum JobUpdate {
    Progress(String),
    Event(Event),
    PhaseStarted {
        phase: String,
        label: String,
    },
    PhaseCompleted {
        phase: String,
        label: String,
    },
    StepStarted {
        phase: String,
        step: String,
    },
    CheckpointSaved {
        phase: String,
        step: String,
        next_step: Option<String>,
    },
    ReviewRequested {
        phase: String,
        step: String,
        output: Value,
        reply: SyncSender<StepDecision>,
    },
}

/// Sending half of the bridge, usable from any blocking thread.
#[derive(Clone)]
pub(super) struct Relay {
    job_id: JobId,
    tx: mpsc::Sender<JobUpdate>,
    timeout: Duration,
}

impl Relay {
    pub(super) fn new(job_id: JobId, tx: mpsc::Sender<JobUpdate>, timeout: Duration) -> Self {
        Self {
            job_id,
            tx,
            timeout,
        }
    }

    /// Hand `update` to the coordinator. Returns false if it was dropped.
    pub(super) fn send(&self, mut update: JobUpdate) -> bool {
        let deadline = Instant::now() + self.timeout;
        loop {
            match self.tx.try_send(update) {
                Ok(()) => return true,
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(job_id = %self.job_id, "relay closed, dropping update");
                    return false;
                }
                Err(TrySendError::Full(returned)) => {
                    if Instant::now() >= deadline {
                        tracing::warn!(
                            job_id = %self.job_id,
                            timeout_ms = self.timeout.as_millis() as u64,
                            "relay full, dropping update"
                        );
                        return false;
                    }
                    update = returned;
                    std::thread::sleep(RELAY_BACKOFF);
                }
            }
        }
    }
}

/// Event sink handed to steps for streamed output.
struct RelaySink {
    relay: Relay,
    flag: CancelFlag,
    partial_mode: String,
}

impl EventSink for RelaySink {
    fn emit(&self, mut event: Event) -> Result<(), CancelReason> {
        self.flag.check()?;
        if event.kind == StreamLogger::PARTIAL {
            event.set_default("mode", self.partial_mode.as_str());
        }
        self.relay.send(JobUpdate::Event(event));
        Ok(())
    }
}

pub(super) struct WorkerContext {
    relay: Relay,
    flag: CancelFlag,
    review: ReviewMode,
    review_poll: Duration,
    partial_mode: String,
}

impl WorkerContext {
    pub(super) fn new(relay: Relay, flag: CancelFlag, review: ReviewMode, config: &Config) -> Self {
        Self {
            relay,
            flag,
            review,
            review_poll: config.review_poll,
            partial_mode: config.partial_mode.clone(),
        }
    }

    /// Block until a reviewer decides, the job is stopped, or the request
    /// cannot be delivered (then the step is approved).
    fn await_review(
        &self,
        phase: &str,
        step: &str,
        output: &Value,
    ) -> Result<StepDecision, CancelReason> {
        let (reply, decisions) = sync_channel(1);
        let delivered = self.relay.send(JobUpdate::ReviewRequested {
            phase: phase.to_string(),
            step: step.to_string(),
            output: output.clone(),
            reply,
        });
        if !delivered {
            self.flag.check()?;
            tracing::warn!(job_id = %self.relay.job_id, phase, step, "review request not delivered, approving");
            return Ok(StepDecision::approve());
        }

        loop {
            self.flag.check()?;
            match decisions.recv_timeout(self.review_poll) {
                Ok(decision) => return Ok(decision),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    self.flag.check()?;
                    tracing::warn!(job_id = %self.relay.job_id, phase, step, "review abandoned, approving");
                    return Ok(StepDecision::approve());
                }
            }
        }
    }
}

impl StepHooks for WorkerContext {
    fn on_step_start(&mut self, phase: &str, step: &str) -> Result<(), CancelReason> {
        self.flag.check()?;
        self.relay.send(JobUpdate::StepStarted {
            phase: phase.to_string(),
            step: step.to_string(),
        });
        Ok(())
    }

    fn on_step_end(
        &mut self,
        phase: &str,
        step: &str,
        output: &Value,
    ) -> Result<StepDecision, CancelReason> {
        self.flag.check()?;
        match self.review {
            ReviewMode::Auto => Ok(StepDecision::approve()),
            ReviewMode::Interactive => self.await_review(phase, step, output),
        }
    }

    fn on_checkpoint_saved(&mut self, phase: &str, step: &str, checkpoint: &PhaseCheckpoint) {
        self.relay.send(JobUpdate::CheckpointSaved {
            phase: phase.to_string(),
            step: step.to_string(),
            next_step: checkpoint.next_step.clone(),
        });
    }
}

impl PipelineContext for WorkerContext {
    fn progress(&mut self, message: &str) {
        self.relay.send(JobUpdate::Progress(message.to_string()));
    }

    fn phase_started(&mut self, phase: &str, label: &str) {
        self.relay.send(JobUpdate::PhaseStarted {
            phase: phase.to_string(),
            label: label.to_string(),
        });
    }

    fn phase_completed(&mut self, phase: &str, label: &str) {
        self.relay.send(JobUpdate::PhaseCompleted {
            phase: phase.to_string(),
            label: label.to_string(),
        });
    }

    fn check_cancelled(&self) -> Result<(), CancelReason> {
        self.flag.check()
    }

    fn sink(&self) -> Arc<dyn EventSink> {
        Arc::new(RelaySink {
            relay: self.relay.clone(),
            flag: self.flag.clone(),
            partial_mode: self.partial_mode.clone(),
        })
    }

    fn hooks(&mut self) -> &mut dyn StepHooks {
        self
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
