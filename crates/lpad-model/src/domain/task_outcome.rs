use serde::{Deserialize, Serialize};

use crate::{TaskHandle, TaskSpec};

/// How the lifecycle of one task spec ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum OutcomeKind {
    /// Task stopped with exit code 0.
    Succeeded,
    /// Task stopped with a non-zero exit code.
    #[serde(rename_all = "camelCase")]
    Failed {
        exit_code: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Poll budget ran out before the task stopped.
    TimedOut { polls: u32 },
    /// The wait was cancelled before the task stopped.
    Interrupted,
    /// Every submission attempt failed; no task was launched.
    SubmissionFailed { reason: String },
    /// A status query failed; the task state is unknown.
    StatusUnavailable { reason: String },
    /// The worker driving this spec terminated abnormally.
    Aborted { reason: String },
}

impl OutcomeKind {
    /// Short symbolic identifier used in logs and metric labels.
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeKind::Succeeded => "succeeded",
            OutcomeKind::Failed { .. } => "failed",
            OutcomeKind::TimedOut { .. } => "timed_out",
            OutcomeKind::Interrupted => "interrupted",
            OutcomeKind::SubmissionFailed { .. } => "submission_failed",
            OutcomeKind::StatusUnavailable { .. } => "status_unavailable",
            OutcomeKind::Aborted { .. } => "aborted",
        }
    }
}

/// Final result of one task spec; exactly one is produced per spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutcome {
    pub spec: TaskSpec,
    /// `None` when the task was never launched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<TaskHandle>,
    pub kind: OutcomeKind,
}

impl TaskOutcome {
    pub fn new(spec: TaskSpec, handle: Option<TaskHandle>, kind: OutcomeKind) -> Self {
        Self { spec, handle, kind }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.kind, OutcomeKind::Succeeded)
    }

    /// Human-readable failure reason; `None` for successes.
    ///
    /// For a non-zero exit this is the backend's stopped reason when one was reported.
    pub fn reason(&self) -> Option<String> {
        match &self.kind {
            OutcomeKind::Succeeded => None,
            OutcomeKind::Failed { exit_code, reason } => Some(
                reason
                    .clone()
                    .unwrap_or_else(|| format!("exit code {exit_code}")),
            ),
            OutcomeKind::TimedOut { polls } => Some(format!("timed out after {polls} polls")),
            OutcomeKind::Interrupted => Some("task monitoring was interrupted".to_string()),
            OutcomeKind::SubmissionFailed { reason }
            | OutcomeKind::StatusUnavailable { reason }
            | OutcomeKind::Aborted { reason } => Some(reason.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> TaskSpec {
        TaskSpec::new("c1", "flyway", "subnet-1", "sg-1")
    }

    #[test]
    fn success_has_no_reason() {
        let outcome = TaskOutcome::new(
            spec(),
            Some(TaskHandle::new("t-1", "c1")),
            OutcomeKind::Succeeded,
        );
        assert!(outcome.is_success());
        assert_eq!(outcome.reason(), None);
    }

    #[test]
    fn failed_reason_prefers_stopped_reason() {
        let with_reason = TaskOutcome::new(
            spec(),
            None,
            OutcomeKind::Failed {
                exit_code: 1,
                reason: Some("boom".into()),
            },
        );
        assert!(!with_reason.is_success());
        assert_eq!(with_reason.reason().as_deref(), Some("boom"));

        let bare = TaskOutcome::new(
            spec(),
            None,
            OutcomeKind::Failed {
                exit_code: 3,
                reason: None,
            },
        );
        assert_eq!(bare.reason().as_deref(), Some("exit code 3"));
    }

    #[test]
    fn unlaunched_outcome_omits_handle() {
        let outcome = TaskOutcome::new(
            spec(),
            None,
            OutcomeKind::SubmissionFailed {
                reason: "unreachable".into(),
            },
        );
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(!json.contains("handle"));
        assert!(json.contains(r#""kind":"submissionFailed""#));
    }
}
