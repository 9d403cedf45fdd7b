use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::validate_path_not_empty;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClusterConfig {
    /// Target directory for the ephemeral instance's on-disk state.
    ///
    /// Must be absent, or an existing empty directory, when the bootstrap
    /// pipeline runs.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Client endpoint the engine binds to once started
    #[serde(default = "default_listen_addr")]
    pub listen_address: SocketAddr,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            listen_address: default_listen_addr(),
            log_dir: default_log_dir(),
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<()> {
        validate_path_not_empty(&self.data_dir, "data_dir")?;
        validate_path_not_empty(&self.log_dir, "log_dir")?;

        if self.listen_address.port() == 0 {
            return Err(config::ConfigError::Message(
                "listen_address must specify a non-zero port".into(),
            )
            .into());
        }

        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    home_dir().join(".dbtestbed")
}

fn default_listen_addr() -> SocketAddr {
    "127.0.0.1:5656".parse().unwrap()
}

fn default_log_dir() -> PathBuf {
    env::temp_dir().join("dbtestbed").join("logs")
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map(PathBuf::from).unwrap_or_else(env::temp_dir)
}
