use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::CaseOutcome;
use super::SetupReport;
use crate::ClusterHandle;
use crate::SetupError;
use crate::TestCaseDescriptor;

/// Runs test-case setup routines against the live cluster with bounded
/// concurrency.
///
/// At most `jobs` setups execute at any instant; completion order is
/// unspecified. On the first failure the dispatcher stops admitting new
/// cases but lets already-admitted ones drain, so `run` always returns with
/// every spawned task finished.
pub struct SetupDispatcher {
    jobs: usize,
}

impl SetupDispatcher {
    pub fn new(jobs: usize) -> Self {
        Self { jobs: jobs.max(1) }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Barrier semantics: returns only once every admitted setup has
    /// completed, so the caller's lifecycle transitions never race with
    /// in-flight work.
    pub async fn run(
        &self,
        cases: Vec<TestCaseDescriptor>,
        cluster: ClusterHandle,
    ) -> SetupReport {
        if cases.is_empty() {
            return SetupReport::default();
        }

        info!(cases = cases.len(), jobs = self.jobs, "dispatching test case setups");

        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let admission = CancellationToken::new();
        let cluster = Arc::new(cluster);

        let mut tasks = Vec::with_capacity(cases.len());
        for case in cases {
            let semaphore = semaphore.clone();
            let admission = admission.clone();
            let cluster = cluster.clone();
            let id = case.id().to_owned();

            let task = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    // The semaphore is never closed while tasks hold a clone.
                    Err(_) => return CaseOutcome::skipped(case.id().to_owned()),
                };

                // A failure observed while this case was queued means it is
                // never admitted.
                if admission.is_cancelled() {
                    debug!(case = case.id(), "skipping setup after earlier failure");
                    return CaseOutcome::skipped(case.id().to_owned());
                }

                debug!(case = case.id(), "running test case setup");
                let outcome = AssertUnwindSafe(case.run_setup(&cluster)).catch_unwind().await;
                match outcome {
                    Ok(Ok(())) => CaseOutcome::succeeded(case.id().to_owned()),
                    Ok(Err(cause)) => {
                        warn!(case = case.id(), error = %cause, "test case setup failed");
                        // Cancel before the permit drops so the next acquirer
                        // already sees the failure.
                        admission.cancel();
                        CaseOutcome::failed(case.id().to_owned(), cause)
                    }
                    Err(panic) => {
                        // A panicking setup poisons only its own case.
                        let cause = SetupError::Panicked(panic_message(panic));
                        warn!(case = case.id(), error = %cause, "test case setup panicked");
                        admission.cancel();
                        CaseOutcome::failed(case.id().to_owned(), cause)
                    }
                }
            });
            tasks.push((id, task));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (id, task) in tasks {
            match task.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(join_err) => {
                    // Catch-all for a task torn down by the runtime itself.
                    warn!(case = %id, error = %join_err, "setup task failed to join");
                    admission.cancel();
                    outcomes.push(CaseOutcome::failed(id, SetupError::Panicked(join_err.to_string())));
                }
            }
        }

        let report = SetupReport::new(outcomes);
        info!(
            total = report.total(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped(),
            "test case setups finished"
        );
        report
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
