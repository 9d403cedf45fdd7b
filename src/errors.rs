//! Testbed Bootstrap Error Hierarchy
//!
//! Defines the error types for the bootstrap pipeline, categorized by
//! pipeline stage: entry preconditions, cluster lifecycle, and test-case
//! setup dispatch.

use std::path::PathBuf;

use config::ConfigError;

use crate::cluster::ClusterError;
use crate::dispatch::SetupAggregateError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Target data directory failed the entry checks. Terminal, no resources
    /// touched.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// Cluster lifecycle transition or engine failure
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// One or more test-case setups failed
    #[error(transparent)]
    Setup(#[from] SetupAggregateError),

    /// Configuration loading or validation failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Instance manifest serialization failure
    #[error(transparent)]
    Manifest(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Entry invariant violations on the target data directory.
///
/// Raised before any on-disk or process resource is touched.
#[derive(Debug, thiserror::Error)]
pub enum PreconditionError {
    #[error("{} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("{} exists and is not empty", .0.display())]
    NotEmpty(PathBuf),
}
