//! Per-step outcomes reported by the runner.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// What went wrong within a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A template referenced a name no earlier step captured. The request
    /// was not issued.
    UnresolvedReference,
    /// The request could not be sent.
    Transport,
    /// The response status did not match the expected status.
    StatusMismatch,
    /// A body check did not hold.
    BodyMismatch,
    /// The declared capture could not be extracted from the response.
    Capture,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::UnresolvedReference => "unresolved reference",
            FailureKind::Transport => "transport",
            FailureKind::StatusMismatch => "status mismatch",
            FailureKind::BodyMismatch => "body mismatch",
            FailureKind::Capture => "capture",
        };
        f.write_str(name)
    }
}

/// One recorded failure: what was expected and what actually happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    pub kind: FailureKind,
    pub expected: Value,
    pub actual: Value,
}

impl StepFailure {
    pub fn new(kind: FailureKind, expected: Value, actual: Value) -> Self {
        Self {
            kind,
            expected,
            actual,
        }
    }
}

/// The outcome of one step. The runner returns one of these per step, in
/// declaration order, whether the step passed or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// The step's `name`, for reporting.
    pub name: String,
    pub passed: bool,
    pub failures: Vec<StepFailure>,
}

impl StepResult {
    pub fn new(name: impl Into<String>, failures: Vec<StepFailure>) -> Self {
        Self {
            name: name.into(),
            passed: failures.is_empty(),
            failures,
        }
    }

    /// True when any recorded failure is of `kind`.
    pub fn failed_with(&self, kind: FailureKind) -> bool {
        self.failures.iter().any(|failure| failure.kind == kind)
    }
}
