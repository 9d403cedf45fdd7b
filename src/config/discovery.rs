use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::validate_path_not_empty;
use crate::Result;

/// Settings handed to the test-case discovery collaborator.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DiscoveryConfig {
    /// Root directory discovery starts from
    #[serde(default = "default_start_dir")]
    pub start_dir: PathBuf,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            start_dir: default_start_dir(),
        }
    }
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<()> {
        validate_path_not_empty(&self.start_dir, "start_dir")
    }
}

fn default_start_dir() -> PathBuf {
    PathBuf::from(".")
}
