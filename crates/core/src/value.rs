// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversion of step outputs into checkpointable JSON.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Capability required of every value stored as a step output or in
/// checkpoint data: it must reduce to a plain JSON value.
///
/// Implemented for every `Serialize` type, so the bound is checked at compile
/// time wherever a step is declared.
pub trait Serializable {
    fn to_plain(&self) -> Result<Value, serde_json::Error>;
}

impl<T: Serialize + ?Sized> Serializable for T {
    fn to_plain(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Rebuild a typed value from checkpointed JSON.
pub fn from_plain<T: DeserializeOwned>(value: &Value) -> Result<T, serde_json::Error> {
    T::deserialize(value)
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
