use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Collaborator seam over the database engine.
///
/// Implementations drive the engine's own control surface on a data
/// directory; the lifecycle state machine stays in [`super::Cluster`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterEngine: Send + Sync {
    /// Allocates on-disk state for a fresh instance under `data_dir`.
    async fn init(
        &self,
        data_dir: &Path,
    ) -> std::result::Result<(), EngineError>;

    /// Launches the engine bound to `data_dir` and waits until it reaches a
    /// ready state.
    ///
    /// On failure the engine process must not be left running.
    async fn start(
        &self,
        data_dir: &Path,
    ) -> std::result::Result<(), EngineError>;

    /// Terminates the engine, forcibly once the grace period runs out.
    ///
    /// Must leave no orphaned process behind, success or not.
    async fn stop(
        &self,
        data_dir: &Path,
    ) -> std::result::Result<(), EngineError>;

    /// Removes all on-disk state under `data_dir`.
    ///
    /// Idempotent when the directory is already absent.
    async fn destroy(
        &self,
        data_dir: &Path,
    ) -> std::result::Result<(), EngineError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("engine process exited with {0}")]
    Exited(ExitStatus),

    #[error("engine did not reach ready state within {0:?}")]
    ReadyTimeout(Duration),

    #[error("engine is not running")]
    NotRunning,
}
