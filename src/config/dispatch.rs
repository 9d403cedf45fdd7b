use std::num::NonZeroUsize;
use std::thread;

use serde::Deserialize;
use serde::Serialize;

/// Concurrency settings for the setup dispatcher.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DispatchConfig {
    /// Maximum number of test-case setups running at any instant.
    ///
    /// `0` (the default) sizes the pool from available hardware parallelism.
    #[serde(default)]
    pub jobs: usize,
}

impl DispatchConfig {
    /// Resolves the configured job count, falling back to the number of
    /// available hardware execution units.
    pub fn effective_jobs(&self) -> usize {
        if self.jobs > 0 {
            return self.jobs;
        }
        thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
    }
}
