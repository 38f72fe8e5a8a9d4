// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured message stream produced while steps run.
//!
//! Steps narrate their work (prose, generated manifests, section headers and
//! token-by-token LLM output) through a [`StreamLogger`]. Each message is
//! kept locally and forwarded to an [`EventSink`], which for a managed job
//! relays it to the job's event log.

use ce_core::{CancelReason, Event};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Destination for events produced on the worker thread.
///
/// `emit` returns `Err(reason)` once the job was asked to stop, so a step
/// that streams output notices cancellation at its next message.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event) -> Result<(), CancelReason>;
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) -> Result<(), CancelReason> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    #[default]
    Assistant,
}

ce_core::simple_display! {
    Role {
        User => "user",
        Assistant => "assistant",
    }
}

pub struct StreamLogger {
    sink: Arc<dyn EventSink>,
    channel: Option<String>,
    history: Vec<Event>,
}

impl StreamLogger {
    pub const WRITE: &'static str = "write";
    pub const CODE: &'static str = "code";
    pub const SUBHEADER: &'static str = "subheader";
    pub const PARTIAL: &'static str = "partial";

    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            channel: None,
            history: Vec::new(),
        }
    }

    /// Tag every event with a channel (e.g. the phase or agent name).
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn history(&self) -> &[Event] {
        &self.history
    }

    pub fn write(&mut self, role: Role, text: &str) -> Result<(), CancelReason> {
        self.push(
            Event::new(Self::WRITE)
                .with("role", role.to_string())
                .with("text", text),
        )
    }

    pub fn code(
        &mut self,
        role: Role,
        code: &str,
        language: Option<&str>,
    ) -> Result<(), CancelReason> {
        self.push(
            Event::new(Self::CODE)
                .with("role", role.to_string())
                .with("code", code)
                .with("language", language),
        )
    }

    pub fn subheader(&mut self, role: Role, text: &str, divider: &str) -> Result<(), CancelReason> {
        self.push(
            Event::new(Self::SUBHEADER)
                .with("role", role.to_string())
                .with("text", text)
                .with("divider", divider),
        )
    }

    /// One chunk of streamed model output.
    pub fn partial(&mut self, role: Role, chunk: &str) -> Result<(), CancelReason> {
        self.push(
            Event::new(Self::PARTIAL)
                .with("role", role.to_string())
                .with("partial", chunk),
        )
    }

    fn push(&mut self, mut event: Event) -> Result<(), CancelReason> {
        if let Some(channel) = &self.channel {
            event.set_default("channel", channel.as_str());
        }
        self.history.push(event.clone());
        self.sink.emit(event)
    }
}

impl std::fmt::Debug for StreamLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamLogger")
            .field("channel", &self.channel)
            .field("history", &self.history.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
