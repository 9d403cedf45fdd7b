use crate::SetupError;
use crate::SetupResult;

/// Result of one test case's setup.
#[derive(Debug)]
pub struct CaseOutcome {
    id: String,
    result: SetupResult,
}

impl CaseOutcome {
    pub fn succeeded(id: String) -> Self {
        Self { id, result: Ok(()) }
    }

    pub fn failed(
        id: String,
        cause: SetupError,
    ) -> Self {
        Self {
            id,
            result: Err(cause),
        }
    }

    pub fn skipped(id: String) -> Self {
        Self {
            id,
            result: Err(SetupError::Skipped),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.result, Err(SetupError::Skipped))
    }

    /// Genuine failure: the routine ran and failed (or panicked). Skips are
    /// counted separately.
    pub fn is_failure(&self) -> bool {
        matches!(self.result, Err(ref e) if !matches!(e, SetupError::Skipped))
    }

    pub fn result(&self) -> &SetupResult {
        &self.result
    }
}

/// Aggregate of every case outcome from one dispatcher run.
#[derive(Debug, Default)]
pub struct SetupReport {
    outcomes: Vec<CaseOutcome>,
}

impl SetupReport {
    pub fn new(outcomes: Vec<CaseOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[CaseOutcome] {
        &self.outcomes
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Collapses the report into the overall result: the report itself on
    /// success, or a [`SetupAggregateError`] wrapping every genuine failure.
    pub fn into_result(self) -> std::result::Result<SetupReport, SetupAggregateError> {
        if self.is_success() {
            return Ok(self);
        }

        let total = self.total();
        let skipped = self.skipped();
        let failures = self
            .outcomes
            .into_iter()
            .filter_map(|outcome| {
                let CaseOutcome { id, result } = outcome;
                match result {
                    Err(SetupError::Skipped) | Ok(()) => None,
                    Err(cause) => Some(CaseFailure { id, cause }),
                }
            })
            .collect();

        Err(SetupAggregateError {
            total,
            skipped,
            failures,
        })
    }
}

/// One or more test-case setups failed.
///
/// Wraps every individual failure so the caller can inspect each case's
/// cause; cases skipped after the first failure are tallied but carry no
/// cause of their own.
#[derive(Debug, thiserror::Error)]
#[error("{} of {total} test case setups failed ({skipped} skipped)", failures.len())]
pub struct SetupAggregateError {
    pub total: usize,
    pub skipped: usize,
    pub failures: Vec<CaseFailure>,
}

#[derive(Debug)]
pub struct CaseFailure {
    pub id: String,
    pub cause: SetupError,
}
