//! Declarative flow documents.
//!
//! A whole flow can be kept in a JSON fixture file and loaded at startup, so
//! the data a suite asserts against stays swappable without touching runner
//! code.

use crate::flow::Step;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An ordered list of steps with a name for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
    pub name: String,
    pub steps: Vec<Step>,
}

impl FlowDocument {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read flow document: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse flow document: {:?}", path))
    }
}
