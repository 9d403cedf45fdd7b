//! Configuration management for the testbed bootstrap pipeline.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Environment variable overrides
//! - Configuration file support
//! - Component-wise validation
mod cluster;
mod discovery;
mod dispatch;
mod engine;

pub use cluster::*;
pub use discovery::*;
pub use dispatch::*;
pub use engine::*;


use std::env;
use std::fmt::Debug;
use std::path::Path;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Main configuration container for the bootstrap pipeline.
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct BootstrapConfig {
    /// Target data directory and client endpoint of the ephemeral instance
    pub cluster: ClusterConfig,
    /// Engine control binary and its readiness/shutdown timing
    pub engine: EngineConfig,
    /// Concurrency limit for the setup dispatcher
    pub dispatch: DispatchConfig,
    /// Root directory handed to the discovery collaborator
    pub discovery: DiscoveryConfig,
}

impl Debug for BootstrapConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("cluster", &self.cluster)
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

impl BootstrapConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources
    /// override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `TESTBED__` prefix (highest priority)
    ///
    /// # Note
    /// This method does NOT validate the configuration. Validation is
    /// deferred to allow further overrides (CLI flags, override files).
    /// Callers MUST call `validate()` before using the configuration.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("TESTBED")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config) // No validation - deferred to validate()
    }

    /// Applies additional configuration overrides from file without
    /// validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("TESTBED")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config) // No validation - deferred to validate()
    }

    /// Validates configuration and returns validated instance.
    ///
    /// Consumes self and performs validation of all subsystems. Must be
    /// called after all configuration overrides to ensure the final config is
    /// valid.
    pub fn validate(self) -> Result<Self> {
        self.cluster.validate()?;
        self.engine.validate()?;
        self.discovery.validate()?;
        Ok(self)
    }
}

/// Ensures a configured path is present.
pub(super) fn validate_path_not_empty(
    path: &Path,
    name: &str,
) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::Config(ConfigError::Message(format!(
            "{name} path cannot be empty"
        ))));
    }
    Ok(())
}
