use std::sync::Arc;

use lpad_model::{RunTaskRequest, TaskHandle, TaskSpec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    backend::TaskBackend,
    error::SubmissionError,
    metrics::{MetricsHandle, noop_metrics},
    retry::{RetryError, RetryPolicy, retry},
};

/// Launches task specs on the backend, retrying transient failures.
pub struct TaskSubmitter {
    backend: Arc<dyn TaskBackend>,
    policy: RetryPolicy,
    metrics: MetricsHandle,
}

impl TaskSubmitter {
    pub fn new(backend: Arc<dyn TaskBackend>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            metrics: noop_metrics(),
        }
    }

    #[inline]
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    #[inline]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Launch one task for `spec`.
    ///
    /// Only the launch call is retried; the first successful attempt returns immediately.
    #[instrument(level = "debug", skip(self, spec, cancel), fields(task = %spec))]
    pub async fn submit(
        &self,
        spec: &TaskSpec,
        cancel: &CancellationToken,
    ) -> Result<TaskHandle, SubmissionError> {
        let request = RunTaskRequest::from(spec);
        debug!(
            backend = self.backend.name(),
            subnet = %spec.subnet_id,
            security_group = %spec.security_group_id,
            "launching task"
        );

        let result = retry(&self.policy, cancel, |attempt| {
            let request = &request;
            async move {
                self.metrics.record_submit_attempt(&request.cluster);
                debug!(attempt, "run task");
                self.backend.run_task(request).await
            }
        })
        .await;

        match result {
            Ok(handle) => {
                info!(handle = %handle, "task started");
                Ok(handle)
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                self.metrics.record_submit_failure(&spec.cluster_id);
                warn!(attempts, error = %last, "task submission failed");
                Err(SubmissionError::Exhausted { attempts, last })
            }
            Err(RetryError::Cancelled { attempts }) => {
                self.metrics.record_submit_failure(&spec.cluster_id);
                warn!(attempts, "task submission interrupted");
                Err(SubmissionError::Interrupted { attempts })
            }
        }
    }
}
