//! Per-run store for the bearer credential and captured values.

use serde_json::Value;
use std::collections::HashMap;

/// Mutable state threaded through a single run.
///
/// Holds the bearer credential and a map from symbolic names to values
/// captured from earlier responses. Exactly one session exists per run; it
/// starts empty (unless the caller seeds it), is populated by captures, and
/// is discarded when the run completes.
#[derive(Debug, Default)]
pub struct Session {
    credential: Option<String>,
    values: HashMap<String, Value>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under a symbolic name, overwriting any prior value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Looks up a previously captured value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set_credential(&mut self, token: impl Into<String>) {
        self.credential = Some(token.into());
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.credential.is_none() && self.values.is_empty()
    }
}
