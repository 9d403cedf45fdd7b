use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::info;

use super::ClusterEngine;
use super::ClusterState;
use super::EngineError;
use crate::ClusterConfig;
use crate::PreconditionError;
use crate::Result;

/// File written into a fresh data directory during `init`.
pub const INSTANCE_MANIFEST: &str = "instance.json";

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("illegal cluster state transition: {from:?} -> {to:?}")]
    IllegalTransition { from: ClusterState, to: ClusterState },

    #[error("cluster initialization failed")]
    Init(#[source] EngineError),

    #[error("cluster failed to reach ready state")]
    Start(#[source] EngineError),

    #[error("cluster failed to stop")]
    Stop(#[source] EngineError),

    #[error("failed to remove data directory {}", path.display())]
    Destroy {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("failed to prepare data directory {}", path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Connection details handed to setup routines.
///
/// Carries only what client-level operations need; lifecycle transitions are
/// not reachable through a handle.
#[derive(Debug, Clone)]
pub struct ClusterHandle {
    pub listen_address: SocketAddr,
    pub data_dir: PathBuf,
}

/// Identity record persisted as [`INSTANCE_MANIFEST`] inside the data
/// directory.
#[derive(Debug, Serialize, Deserialize)]
pub struct InstanceManifest {
    pub instance_id: String,
    pub listen_address: SocketAddr,
}

/// Owns the on-disk and running-process state of one ephemeral instance.
///
/// All transitions are single-threaded; only the orchestrator calls them, and
/// never concurrently with dispatcher execution, so the state machine needs
/// no lock.
pub struct Cluster<E>
where
    E: ClusterEngine,
{
    config: ClusterConfig,
    state: ClusterState,
    engine: E,
}

impl<E> Cluster<E>
where
    E: ClusterEngine,
{
    pub fn new(
        config: ClusterConfig,
        engine: E,
    ) -> Self {
        Self {
            config,
            state: ClusterState::Uninitialized,
            engine,
        }
    }

    pub fn state(&self) -> ClusterState {
        self.state
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Connection handle for setup routines. Meaningful once the cluster is
    /// running.
    pub fn handle(&self) -> ClusterHandle {
        ClusterHandle {
            listen_address: self.config.listen_address,
            data_dir: self.config.data_dir.clone(),
        }
    }

    /// Creates (or reuses) the data directory, writes the instance manifest
    /// and lets the engine allocate its on-disk state.
    ///
    /// The entry invariant is re-checked here: the directory must be absent
    /// or an existing empty directory. A failure partway removes everything
    /// created so far; the engine process is never left running by a failed
    /// `init`.
    pub async fn init(&mut self) -> Result<()> {
        self.guard(ClusterState::Initialized)?;
        check_data_dir(&self.config.data_dir)?;

        tokio::fs::create_dir_all(&self.config.data_dir)
            .await
            .map_err(|source| ClusterError::DataDir {
                path: self.config.data_dir.clone(),
                source,
            })?;

        if let Err(e) = self.allocate().await {
            // Nothing partial may survive a failed allocation.
            if let Err(rm_err) = tokio::fs::remove_dir_all(&self.config.data_dir).await {
                error!(error = %rm_err, "failed to remove partially initialized data directory");
            }
            return Err(e);
        }

        self.advance(ClusterState::Initialized);
        Ok(())
    }

    /// Starts the engine bound to the data directory and waits for readiness.
    pub async fn start(&mut self) -> Result<()> {
        self.guard(ClusterState::Running)?;

        self.engine
            .start(&self.config.data_dir)
            .await
            .map_err(ClusterError::Start)?;

        self.advance(ClusterState::Running);
        Ok(())
    }

    /// Gracefully terminates the engine.
    ///
    /// The engine's stop contract leaves no process behind even on error, so
    /// the state advances to `Stopped` either way; the error still surfaces.
    pub async fn stop(&mut self) -> Result<()> {
        self.guard(ClusterState::Stopped)?;

        let result = self.engine.stop(&self.config.data_dir).await;
        self.advance(ClusterState::Stopped);

        result.map_err(|e| ClusterError::Stop(e).into())
    }

    /// Recursively removes the data directory. Valid only from `Stopped`;
    /// idempotent when the directory is already absent.
    pub async fn destroy(&mut self) -> Result<()> {
        self.guard(ClusterState::Destroyed)?;

        self.engine
            .destroy(&self.config.data_dir)
            .await
            .map_err(|source| ClusterError::Destroy {
                path: self.config.data_dir.clone(),
                source,
            })?;

        self.advance(ClusterState::Destroyed);
        info!(data_dir = %self.config.data_dir.display(), "cluster destroyed");
        Ok(())
    }

    async fn allocate(&self) -> Result<()> {
        self.write_manifest().await?;
        self.engine
            .init(&self.config.data_dir)
            .await
            .map_err(ClusterError::Init)?;
        Ok(())
    }

    async fn write_manifest(&self) -> Result<()> {
        let manifest = InstanceManifest {
            instance_id: nanoid::nanoid!(),
            listen_address: self.config.listen_address,
        };
        let body = serde_json::to_vec_pretty(&manifest)?;
        tokio::fs::write(self.config.data_dir.join(INSTANCE_MANIFEST), body).await?;
        Ok(())
    }

    fn guard(
        &self,
        next: ClusterState,
    ) -> std::result::Result<(), ClusterError> {
        if self.state.can_transition_to(next) {
            Ok(())
        } else {
            Err(ClusterError::IllegalTransition {
                from: self.state,
                to: next,
            })
        }
    }

    fn advance(
        &mut self,
        next: ClusterState,
    ) {
        debug!(from = ?self.state, to = ?next, "cluster state transition");
        self.state = next;
    }
}

/// Entry invariant on the target data directory: absent, or an existing empty
/// directory. Touches nothing.
pub fn check_data_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if !path.is_dir() {
        return Err(PreconditionError::NotADirectory(path.to_path_buf()).into());
    }
    if path.read_dir()?.next().is_some() {
        return Err(PreconditionError::NotEmpty(path.to_path_buf()).into());
    }
    Ok(())
}
