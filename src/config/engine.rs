use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::validate_path_not_empty;
use crate::Result;

/// Settings for the engine control binary that backs the ephemeral instance.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    /// Engine control binary. Resolved through `PATH` when not absolute.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// How long `start` waits for the engine to accept connections before
    /// giving up
    #[serde(default = "default_ready_timeout_in_ms")]
    pub ready_timeout_in_ms: u64,

    /// Interval between readiness probes while waiting for `start`
    #[serde(default = "default_poll_interval_in_ms")]
    pub poll_interval_in_ms: u64,

    /// Grace period a graceful `stop` is given before the engine process is
    /// force-killed
    #[serde(default = "default_stop_grace_in_ms")]
    pub stop_grace_in_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            ready_timeout_in_ms: default_ready_timeout_in_ms(),
            poll_interval_in_ms: default_poll_interval_in_ms(),
            stop_grace_in_ms: default_stop_grace_in_ms(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        validate_path_not_empty(&self.binary, "engine binary")?;

        if self.ready_timeout_in_ms == 0 {
            return Err(config::ConfigError::Message(
                "ready_timeout_in_ms must be greater than zero".into(),
            )
            .into());
        }
        if self.poll_interval_in_ms == 0 {
            return Err(config::ConfigError::Message(
                "poll_interval_in_ms must be greater than zero".into(),
            )
            .into());
        }
        if self.poll_interval_in_ms >= self.ready_timeout_in_ms {
            return Err(config::ConfigError::Message(
                "poll_interval_in_ms must be smaller than ready_timeout_in_ms".into(),
            )
            .into());
        }

        Ok(())
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("dbengine")
}

fn default_ready_timeout_in_ms() -> u64 {
    30_000
}

fn default_poll_interval_in_ms() -> u64 {
    100
}

fn default_stop_grace_in_ms() -> u64 {
    5_000
}
