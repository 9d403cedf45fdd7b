use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io;
use tokio::net::TcpStream;
use tokio::process::Child;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::ClusterEngine;
use super::EngineError;
use crate::EngineConfig;

/// Production [`ClusterEngine`] driving an external engine control binary.
///
/// `start` keeps the serving child process; `stop` asks the binary for a
/// graceful shutdown first and force-kills the child once the grace period
/// runs out, so no orphaned process survives either path.
pub struct ProcessEngine {
    config: EngineConfig,
    listen_address: SocketAddr,
    child: Mutex<Option<Child>>,
}

impl ProcessEngine {
    pub fn new(
        config: EngineConfig,
        listen_address: SocketAddr,
    ) -> Self {
        Self {
            config,
            listen_address,
            child: Mutex::new(None),
        }
    }

    async fn wait_until_ready(
        &self,
        child: &mut Child,
    ) -> std::result::Result<(), EngineError> {
        let timeout = Duration::from_millis(self.config.ready_timeout_in_ms);
        let poll = Duration::from_millis(self.config.poll_interval_in_ms);
        let deadline = time::Instant::now() + timeout;

        loop {
            if let Some(status) = child.try_wait()? {
                return Err(EngineError::Exited(status));
            }
            if TcpStream::connect(self.listen_address).await.is_ok() {
                debug!(address = %self.listen_address, "engine accepts connections");
                return Ok(());
            }
            if time::Instant::now() >= deadline {
                return Err(EngineError::ReadyTimeout(timeout));
            }
            time::sleep(poll).await;
        }
    }

    async fn reap(child: &mut Child) -> io::Result<()> {
        child.start_kill()?;
        child.wait().await?;
        Ok(())
    }
}

#[async_trait]
impl ClusterEngine for ProcessEngine {
    async fn init(
        &self,
        data_dir: &Path,
    ) -> std::result::Result<(), EngineError> {
        let status = Command::new(&self.config.binary)
            .arg("init")
            .arg("--data-dir")
            .arg(data_dir)
            .status()
            .await?;

        if !status.success() {
            return Err(EngineError::Exited(status));
        }
        Ok(())
    }

    async fn start(
        &self,
        data_dir: &Path,
    ) -> std::result::Result<(), EngineError> {
        let mut child = Command::new(&self.config.binary)
            .arg("serve")
            .arg("--data-dir")
            .arg(data_dir)
            .arg("--listen")
            .arg(self.listen_address.to_string())
            .kill_on_drop(true)
            .spawn()?;

        if let Err(e) = self.wait_until_ready(&mut child).await {
            // A child that never became ready must not outlive the failure.
            if let Err(kill_err) = Self::reap(&mut child).await {
                warn!(error = %kill_err, "failed to reap engine child after start failure");
            }
            return Err(e);
        }

        info!(address = %self.listen_address, "engine ready");
        *self.child.lock().await = Some(child);
        Ok(())
    }

    async fn stop(
        &self,
        data_dir: &Path,
    ) -> std::result::Result<(), EngineError> {
        let Some(mut child) = self.child.lock().await.take() else {
            return Err(EngineError::NotRunning);
        };

        let grace = Duration::from_millis(self.config.stop_grace_in_ms);

        // Ask the engine to shut itself down; an unresponsive engine falls
        // through to the force-kill path below.
        let shutdown = Command::new(&self.config.binary)
            .arg("stop")
            .arg("--data-dir")
            .arg(data_dir)
            .kill_on_drop(true)
            .status();
        match time::timeout(grace, shutdown).await {
            Ok(Ok(status)) => debug!(%status, "engine stop command finished"),
            Ok(Err(e)) => debug!(error = %e, "engine stop command failed"),
            Err(_) => debug!("engine stop command still running after grace period"),
        }

        match time::timeout(grace, child.wait()).await {
            Ok(status) => {
                debug!(status = ?status, "engine exited");
                status?;
            }
            Err(_) => {
                warn!("engine unresponsive after {:?}, force-killing", grace);
                Self::reap(&mut child).await?;
            }
        }
        Ok(())
    }

    async fn destroy(
        &self,
        data_dir: &Path,
    ) -> std::result::Result<(), EngineError> {
        match tokio::fs::remove_dir_all(data_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
