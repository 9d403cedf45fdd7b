//! Bootstraps an ephemeral database instance for an integration test suite.
//!
//! One pass creates the instance's data directory, starts the engine, runs
//! every discovered test case's setup routine against it with bounded
//! concurrency, then stops the instance. On success the populated data
//! directory is retained for reuse; on any failure the instance is fully
//! torn down so nothing half-initialized is left behind.

mod cluster;
mod config;
mod discovery;
mod dispatch;
mod errors;
mod orchestrator;

pub use cluster::*;
pub use config::*;
pub use discovery::*;
pub use dispatch::*;
pub use errors::*;
pub use orchestrator::*;
