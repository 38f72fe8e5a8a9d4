// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step declaration: name, dependencies, output key and the work itself.

use ce_core::{from_plain, CancelReason, RetryContext, Serializable};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Results of a run keyed by output key, in insertion order.
pub type StepOutputs = IndexMap<String, Value>;

#[derive(Debug, Error)]
pub enum StepError {
    #[error("{0}")]
    Failed(String),
    #[error("missing input '{0}'")]
    MissingInput(String),
    #[error("input '{key}' has unexpected shape: {source}")]
    BadInput {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("output is not serializable: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("retry budget exhausted after {attempts} attempts: {last_error}")]
    RetryBudgetExhausted { attempts: u32, last_error: String },
    #[error("interrupted ({0})")]
    Interrupted(CancelReason),
}

impl StepError {
    pub fn failed(message: impl Into<String>) -> Self {
        StepError::Failed(message.into())
    }
}

impl From<CancelReason> for StepError {
    fn from(reason: CancelReason) -> Self {
        StepError::Interrupted(reason)
    }
}

/// Values a step declared it depends on.
///
/// Every declared key is present; a key whose producer has not run maps to
/// `None` and the step decides how to handle it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepInputs {
    values: IndexMap<String, Option<Value>>,
}

impl StepInputs {
    pub(crate) fn new(values: IndexMap<String, Option<Value>>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).and_then(Option::as_ref)
    }

    pub fn is_missing(&self, key: &str) -> bool {
        self.get(key).is_none()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Decode a required input.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, StepError> {
        self.optional(key)?
            .ok_or_else(|| StepError::MissingInput(key.to_string()))
    }

    /// Decode an input that may legitimately be absent.
    pub fn optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StepError> {
        self.get(key)
            .map(|value| {
                from_plain(value).map_err(|source| StepError::BadInput {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }
}

type RetryFn = Box<dyn FnMut(&StepInputs, &RetryContext) -> Result<Value, StepError> + Send>;
type PlainFn = Box<dyn FnMut(&StepInputs) -> Result<Value, StepError> + Send>;

/// The work of a step, tagged with whether it can use reviewer feedback.
pub enum StepFn {
    /// Receives the retry history of the current cycle (empty on the first attempt).
    WithRetry(RetryFn),
    /// Never sees retry history.
    WithoutRetry(PlainFn),
}

pub struct Step {
    name: String,
    depends_on: Vec<String>,
    output_key: String,
    checkpoint_after: bool,
    exec: StepFn,
}

impl Step {
    /// A step that does not take retry feedback.
    pub fn new<F, T>(name: impl Into<String>, output_key: impl Into<String>, mut f: F) -> Self
    where
        F: FnMut(&StepInputs) -> Result<T, StepError> + Send + 'static,
        T: Serializable,
    {
        Self::from_fn(
            name,
            output_key,
            StepFn::WithoutRetry(Box::new(move |inputs| {
                f(inputs)?.to_plain().map_err(StepError::Serialize)
            })),
        )
    }

    /// A step that revises its output using the retry history.
    pub fn with_retry<F, T>(name: impl Into<String>, output_key: impl Into<String>, mut f: F) -> Self
    where
        F: FnMut(&StepInputs, &RetryContext) -> Result<T, StepError> + Send + 'static,
        T: Serializable,
    {
        Self::from_fn(
            name,
            output_key,
            StepFn::WithRetry(Box::new(move |inputs, retry| {
                f(inputs, retry)?.to_plain().map_err(StepError::Serialize)
            })),
        )
    }

    pub fn from_fn(name: impl Into<String>, output_key: impl Into<String>, exec: StepFn) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            output_key: output_key.into(),
            checkpoint_after: true,
            exec,
        }
    }

    /// Declare input keys. Order is kept and duplicates are ignored.
    pub fn depends_on<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            let key = key.into();
            if !self.depends_on.contains(&key) {
                self.depends_on.push(key);
            }
        }
        self
    }

    /// Whether completing this step writes a checkpoint (default true).
    pub fn checkpoint_after(mut self, enabled: bool) -> Self {
        self.checkpoint_after = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    pub fn checkpoints(&self) -> bool {
        self.checkpoint_after
    }

    pub fn accepts_retry(&self) -> bool {
        matches!(self.exec, StepFn::WithRetry(_))
    }

    pub(crate) fn execute(
        &mut self,
        inputs: &StepInputs,
        retry: &RetryContext,
    ) -> Result<Value, StepError> {
        match &mut self.exec {
            StepFn::WithRetry(f) => f(inputs, retry),
            StepFn::WithoutRetry(f) => {
                if !retry.is_empty() {
                    tracing::warn!(
                        step = %self.name,
                        history = retry.len(),
                        "step does not accept retry feedback; re-running without it"
                    );
                }
                f(inputs)
            }
        }
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("output_key", &self.output_key)
            .field("checkpoint_after", &self.checkpoint_after)
            .field("accepts_retry", &self.accepts_retry())
            .finish()
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
