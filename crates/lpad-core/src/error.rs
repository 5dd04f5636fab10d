use thiserror::Error;

use crate::orchestrator::RunReport;

/// Failure of a single backend call.
///
/// The submitter treats every variant as a failed launch attempt and retries it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend rejected request: {0}")]
    Rejected(String),
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
    #[error("task not found: {0}")]
    TaskNotFound(String),
}

/// Submission of one task spec gave up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("submission failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: BackendError },
    #[error("submission interrupted after {attempts} attempts")]
    Interrupted { attempts: u32 },
}

/// Failure of a whole orchestration run.
///
/// The report inside carries the outcome of every spec, failed or not.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("{} of {} tasks failed: {}", .0.failed().count(), .0.outcomes.len(), .0.failure_summary())]
    TasksFailed(RunReport),
}

impl OrchestratorError {
    pub fn report(&self) -> &RunReport {
        match self {
            OrchestratorError::TasksFailed(report) => report,
        }
    }
}
