//! Test-case discovery collaborator interface.
//!
//! The bootstrap core never inspects the filesystem itself: a
//! [`CaseDiscovery`] implementation walks whatever layout it understands and
//! hands back opaque [`TestCaseDescriptor`]s, each carrying the one-time
//! setup routine to run against the live cluster.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::ClusterHandle;
use crate::Result;

pub type SetupResult = std::result::Result<(), SetupError>;

/// One test case's preparation work, executed against the running cluster.
///
/// Routines perform client-level operations only and must be safe to run
/// concurrently with unrelated routines; there is no ordering between cases.
#[async_trait]
pub trait SetupRoutine: Send + Sync {
    async fn run(
        &self,
        cluster: &ClusterHandle,
    ) -> SetupResult;
}

/// Failure of a single test case's setup.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Client-level operation against the cluster failed
    #[error("{0}")]
    Client(String),

    /// The setup task panicked; the panic is contained to this case
    #[error("setup task panicked: {0}")]
    Panicked(String),

    /// Never admitted: an earlier setup had already failed
    #[error("skipped after an earlier setup failure")]
    Skipped,
}

/// Opaque identifier plus setup routine, as produced by discovery.
/// Immutable once produced.
#[derive(Clone)]
pub struct TestCaseDescriptor {
    id: String,
    setup: Arc<dyn SetupRoutine>,
}

impl TestCaseDescriptor {
    pub fn new(
        id: impl Into<String>,
        setup: Arc<dyn SetupRoutine>,
    ) -> Self {
        Self {
            id: id.into(),
            setup,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn run_setup(
        &self,
        cluster: &ClusterHandle,
    ) -> SetupResult {
        self.setup.run(cluster).await
    }
}

impl fmt::Debug for TestCaseDescriptor {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TestCaseDescriptor").field("id", &self.id).finish()
    }
}

/// Discovery collaborator: given a root directory, produces the runnable
/// test cases.
pub trait CaseDiscovery: Send + Sync {
    fn discover(
        &self,
        start_dir: &Path,
    ) -> Result<Vec<TestCaseDescriptor>>;
}

/// Discovery stand-in returning an empty suite.
///
/// The standalone binary uses this: it bootstraps a ready-to-populate
/// instance, while embedding harnesses wire in their own discoverer.
pub struct EmptySuite;

impl CaseDiscovery for EmptySuite {
    fn discover(
        &self,
        _start_dir: &Path,
    ) -> Result<Vec<TestCaseDescriptor>> {
        Ok(Vec::new())
    }
}
