//! Common test infrastructure
//!
//! This module provides the in-process bookstore API that end-to-end tests
//! run flows against. Tests should only import from this module, not from
//! internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestServer;
//! use flow_runner::flow::{FlowRunner, Step};
//!
//! #[tokio::test]
//! async fn test_status() {
//!     let server = TestServer::spawn().await;
//!     let runner = FlowRunner::new(server.base_url.clone());
//!
//!     let results = runner.run(&[Step::get("api status", "/status")]).await;
//!     assert!(results[0].passed);
//! }
//! ```

mod constants;
mod server;

// Public API - this is what tests import
pub use constants::*;
pub use server::TestServer;
