use serde::{Deserialize, Serialize};

/// Status of a remote task as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum TaskStatus {
    /// Accepted by the backend, not yet executing.
    Pending,
    /// Primary container is executing.
    Running,
    /// Task finished; no further transitions happen.
    #[serde(rename_all = "camelCase")]
    Stopped {
        /// Exit code of the task's primary container.
        exit_code: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stopped_reason: Option<String>,
    },
}

impl TaskStatus {
    pub fn stopped(exit_code: i32) -> Self {
        TaskStatus::Stopped {
            exit_code,
            stopped_reason: None,
        }
    }

    pub fn stopped_with_reason(exit_code: i32, reason: impl Into<String>) -> Self {
        TaskStatus::Stopped {
            exit_code,
            stopped_reason: Some(reason.into()),
        }
    }

    /// Returns `true` if the task is in a terminal state (won't transition further).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Stopped { .. })
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Stopped { .. } => "stopped",
        }
    }
}
