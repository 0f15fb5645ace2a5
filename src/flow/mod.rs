//! Stateful execution of ordered HTTP steps.
//!
//! A flow is a sequence of [`Step`]s executed in declaration order by the
//! [`FlowRunner`]. Values captured from earlier responses live in the
//! [`Session`] and resolve `{name}` references in later requests and
//! expectations.

mod matcher;
mod result;
mod runner;
mod session;
mod step;
mod template;

pub use result::{FailureKind, StepFailure, StepResult};
pub use runner::FlowRunner;
pub use session::Session;
pub use step::{BodyCheck, Capture, CaptureTarget, Expectation, Method, Shape, Step};
pub use template::ResolveError;
