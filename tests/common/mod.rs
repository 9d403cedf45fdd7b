use std::io;
use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use db_testbed::BootstrapConfig;
use db_testbed::ClusterEngine;
use db_testbed::ClusterHandle;
use db_testbed::EngineError;
use db_testbed::SetupError;
use db_testbed::SetupResult;
use db_testbed::SetupRoutine;
use db_testbed::TestCaseDescriptor;

/// Call counters shared between a [`ScriptedEngine`] and the test body.
#[derive(Default)]
pub struct EngineCalls {
    pub init: AtomicUsize,
    pub start: AtomicUsize,
    pub stop: AtomicUsize,
    pub destroy: AtomicUsize,
}

/// In-process engine stand-in with real filesystem side effects.
///
/// `init` allocates an engine config file inside the data directory and
/// `destroy` removes the directory, so directory-level invariants can be
/// asserted end to end without an external binary.
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    pub calls: Arc<EngineCalls>,
    fail_init: bool,
    fail_start: bool,
    fail_stop: bool,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_init() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn failing_stop() -> Self {
        Self {
            fail_stop: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ClusterEngine for ScriptedEngine {
    async fn init(
        &self,
        data_dir: &Path,
    ) -> Result<(), EngineError> {
        self.calls.init.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(EngineError::Io(io::Error::new(
                io::ErrorKind::Other,
                "scripted init failure",
            )));
        }
        tokio::fs::write(data_dir.join("engine.conf"), b"port = 5656\n").await?;
        Ok(())
    }

    async fn start(
        &self,
        _data_dir: &Path,
    ) -> Result<(), EngineError> {
        self.calls.start.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(EngineError::ReadyTimeout(Duration::from_millis(10)));
        }
        Ok(())
    }

    async fn stop(
        &self,
        _data_dir: &Path,
    ) -> Result<(), EngineError> {
        self.calls.stop.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err(EngineError::Io(io::Error::new(
                io::ErrorKind::Other,
                "scripted stop failure",
            )));
        }
        Ok(())
    }

    async fn destroy(
        &self,
        data_dir: &Path,
    ) -> Result<(), EngineError> {
        self.calls.destroy.fetch_add(1, Ordering::SeqCst);
        match tokio::fs::remove_dir_all(data_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Concurrency tracking shared across setup routines.
#[derive(Default)]
pub struct SetupStats {
    pub current: AtomicUsize,
    pub max: AtomicUsize,
    pub completed: AtomicUsize,
}

pub struct TrackedSetup {
    stats: Arc<SetupStats>,
    fail: bool,
    delay: Duration,
}

#[async_trait]
impl SetupRoutine for TrackedSetup {
    async fn run(
        &self,
        _cluster: &ClusterHandle,
    ) -> SetupResult {
        let in_flight = self.stats.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max.fetch_max(in_flight, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.stats.current.fetch_sub(1, Ordering::SeqCst);
        self.stats.completed.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            Err(SetupError::Client("scripted setup failure".into()))
        } else {
            Ok(())
        }
    }
}

pub fn tracked_cases(
    n: usize,
    stats: &Arc<SetupStats>,
) -> Vec<TestCaseDescriptor> {
    (0..n)
        .map(|i| {
            TestCaseDescriptor::new(
                format!("case_{i:03}"),
                Arc::new(TrackedSetup {
                    stats: stats.clone(),
                    fail: false,
                    delay: Duration::from_millis(5),
                }),
            )
        })
        .collect()
}

pub fn failing_case(
    id: &str,
    stats: &Arc<SetupStats>,
) -> TestCaseDescriptor {
    TestCaseDescriptor::new(
        id,
        Arc::new(TrackedSetup {
            stats: stats.clone(),
            fail: true,
            delay: Duration::from_millis(5),
        }),
    )
}

pub fn test_config(
    data_dir: &Path,
    jobs: usize,
) -> BootstrapConfig {
    let mut config = BootstrapConfig::default();
    config.cluster.data_dir = data_dir.to_path_buf();
    config.dispatch.jobs = jobs;
    config
}
