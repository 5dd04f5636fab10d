use std::sync::Arc;

use lpad_model::{OutcomeKind, TaskHandle, TaskOutcome, TaskSpec, TaskStatus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{backend::TaskBackend, config::MonitorConfig};

/// Polls a launched task until it stops or the poll budget runs out.
pub struct TaskMonitor {
    backend: Arc<dyn TaskBackend>,
    cfg: MonitorConfig,
}

impl TaskMonitor {
    pub fn new(backend: Arc<dyn TaskBackend>, cfg: MonitorConfig) -> Self {
        Self { backend, cfg }
    }

    #[inline]
    pub fn config(&self) -> &MonitorConfig {
        &self.cfg
    }

    /// Wait for `handle` to reach a terminal state and classify the result.
    ///
    /// At most `max_polls` status queries are made, one per poll interval; there is no
    /// sleep after the last one. Cancellation during a sleep ends the wait as
    /// [`OutcomeKind::Interrupted`].
    #[instrument(level = "debug", skip(self, spec, handle, cancel), fields(task = %spec, handle = %handle))]
    pub async fn wait(
        &self,
        spec: TaskSpec,
        handle: TaskHandle,
        cancel: &CancellationToken,
    ) -> TaskOutcome {
        let kind = self.poll_until_stopped(&handle, cancel).await;
        TaskOutcome::new(spec, Some(handle), kind)
    }

    async fn poll_until_stopped(
        &self,
        handle: &TaskHandle,
        cancel: &CancellationToken,
    ) -> OutcomeKind {
        let max_polls = self.cfg.max_polls;
        let mut last: Option<TaskStatus> = None;

        for poll in 1..=max_polls {
            debug!(poll, max_polls, "checking task status");

            let status = match self.backend.describe_task(handle).await {
                Ok(status) => status,
                Err(e) => {
                    error!(poll, error = %e, "task status query failed");
                    return OutcomeKind::StatusUnavailable {
                        reason: e.to_string(),
                    };
                }
            };

            if let Some(prev) = &last
                && status_rank(&status) < status_rank(prev)
            {
                warn!(
                    previous = prev.label(),
                    current = status.label(),
                    "backend reported an earlier status than before"
                );
            }

            let status = match status {
                TaskStatus::Stopped {
                    exit_code,
                    stopped_reason,
                } => return classify_stop(exit_code, stopped_reason),
                in_progress => in_progress,
            };

            debug!(status = status.label(), "task still in progress");
            if last.as_ref().is_none_or(|prev| status_rank(&status) >= status_rank(prev)) {
                last = Some(status);
            }

            if poll == max_polls {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.cfg.poll_interval()) => {}
                _ = cancel.cancelled() => {
                    error!(poll, "task monitoring interrupted");
                    return OutcomeKind::Interrupted;
                }
            }
        }

        error!(
            polls = max_polls,
            budget_secs = self.cfg.budget().as_secs(),
            "task monitoring timed out"
        );
        OutcomeKind::TimedOut { polls: max_polls }
    }
}

fn classify_stop(exit_code: i32, stopped_reason: Option<String>) -> OutcomeKind {
    if exit_code == 0 {
        info!("task completed successfully");
        return OutcomeKind::Succeeded;
    }

    error!(
        exit_code,
        reason = stopped_reason.as_deref().unwrap_or("unknown"),
        "task failed"
    );
    OutcomeKind::Failed {
        exit_code,
        reason: stopped_reason,
    }
}

fn status_rank(status: &TaskStatus) -> u8 {
    match status {
        TaskStatus::Pending => 0,
        TaskStatus::Running => 1,
        TaskStatus::Stopped { .. } => 2,
    }
}
