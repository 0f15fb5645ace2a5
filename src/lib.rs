//! Flow Runner Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod flow;
pub mod suite;

// Re-export commonly used types for convenience
pub use flow::{FailureKind, FlowRunner, Session, Step, StepResult};
pub use suite::FlowDocument;
