//! Sequences cluster lifecycle transitions around the setup dispatcher.
//!
//! One bootstrap pass either runs to completion, leaving a populated
//! instance stopped at rest, or fails atomically with the instance fully
//! torn down. The cleanup rule is the single cross-cutting invariant here:
//! every reachable failure path ends with the cluster either absent
//! (destroyed) or cleanly stopped; nothing half-initialized survives.


use std::time::Duration;
use std::time::Instant;

use tracing::error;
use tracing::info;

use crate::check_data_dir;
use crate::BootstrapConfig;
use crate::Cluster;
use crate::ClusterEngine;
use crate::Result;
use crate::SetupDispatcher;
use crate::TestCaseDescriptor;

/// What to do with the instance once the dispatcher has finished.
///
/// A populated instance is kept for reuse by later runs; a failed run must
/// leave nothing behind. Threading this decision explicitly through the
/// unwind path replaces any mutable "destroy it later" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Teardown {
    Retain,
    Destroy,
}

/// Outcome of a successful bootstrap pass.
#[derive(Debug)]
pub struct BootstrapSummary {
    pub data_dir: std::path::PathBuf,
    pub cases_run: usize,
    pub elapsed: Duration,
}

/// Runs one bootstrap pass to completion or fails it atomically.
///
/// Sequence: validate the data directory, `init`, `start`, dispatch every
/// case's setup, then `stop` (success) or `stop` + `destroy` (failure).
pub async fn bootstrap<E>(
    config: BootstrapConfig,
    engine: E,
    cases: Vec<TestCaseDescriptor>,
) -> Result<BootstrapSummary>
where
    E: ClusterEngine,
{
    // Checked once up front so a bad target fails before any resource is
    // touched; `Cluster::init` re-checks the same invariant.
    check_data_dir(&config.cluster.data_dir)?;

    let jobs = config.dispatch.effective_jobs();
    let dispatcher = SetupDispatcher::new(jobs);
    let mut cluster = Cluster::new(config.cluster.clone(), engine);

    let started = Instant::now();
    info!(
        data_dir = %cluster.data_dir().display(),
        cases = cases.len(),
        jobs,
        "bootstrapping test database instance"
    );

    cluster.init().await.inspect_err(|_| {
        // `init` removes its own partial work; this is the backstop for the
        // directory itself.
        remove_data_dir_best_effort(&config);
    })?;

    if let Err(e) = cluster.start().await {
        // The engine guarantees no process survives a failed start, so the
        // directory is all that is left to clean up.
        remove_data_dir_best_effort(&config);
        return Err(e);
    }

    // From here on the cluster is running: every exit path below must stop
    // it, and failure paths must also destroy it.
    let run_result = dispatcher.run(cases, cluster.handle()).await.into_result();

    match run_result {
        Ok(report) => {
            unwind(&mut cluster, Teardown::Retain).await?;
            let summary = BootstrapSummary {
                data_dir: cluster.data_dir().to_path_buf(),
                cases_run: report.total(),
                elapsed: started.elapsed(),
            };
            info!(
                data_dir = %summary.data_dir.display(),
                cases = summary.cases_run,
                elapsed = ?summary.elapsed,
                "test instance initialized and populated"
            );
            Ok(summary)
        }
        Err(aggregate) => {
            if let Err(unwind_err) = unwind(&mut cluster, Teardown::Destroy).await {
                // The setup failure is the primary error; teardown trouble
                // must not mask it.
                error!(error = %unwind_err, "cluster teardown after setup failure also failed");
            }
            Err(aggregate.into())
        }
    }
}

/// Stops the running cluster and, on the failure path, destroys it.
///
/// A failed stop on the retain path downgrades to full teardown: an instance
/// that cannot stop cleanly is not worth keeping.
async fn unwind<E>(
    cluster: &mut Cluster<E>,
    mode: Teardown,
) -> Result<()>
where
    E: ClusterEngine,
{
    let stop_result = cluster.stop().await;

    match mode {
        Teardown::Retain => {
            if let Err(stop_err) = stop_result {
                if let Err(destroy_err) = cluster.destroy().await {
                    error!(error = %destroy_err, "cluster destroy failed during unwind");
                }
                return Err(stop_err);
            }
            Ok(())
        }
        Teardown::Destroy => {
            if let Err(stop_err) = stop_result {
                error!(error = %stop_err, "cluster stop failed during unwind");
            }
            cluster.destroy().await
        }
    }
}

fn remove_data_dir_best_effort(config: &BootstrapConfig) {
    let path = &config.cluster.data_dir;
    if !path.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(path) {
        error!(data_dir = %path.display(), error = %e, "failed to remove data directory after bootstrap failure");
    }
}
