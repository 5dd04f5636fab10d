//! Fan-out of task specs to concurrent workers and aggregation of their outcomes.

use std::sync::Arc;

use lpad_model::{OutcomeKind, TaskOutcome, TaskSpec, parse_task_specs};
use tokio::{sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::{
    backend::TaskBackend,
    config::OrchestratorConfig,
    error::{OrchestratorError, SubmissionError},
    metrics::{MetricsHandle, noop_metrics},
    monitor::TaskMonitor,
    submitter::TaskSubmitter,
};

/// Outcomes of one orchestration run, in the order the specs were configured.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<TaskOutcome>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(TaskOutcome::is_success)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// `spec: reason` for every failed outcome, joined with `; `.
    pub fn failure_summary(&self) -> String {
        self.failed()
            .map(|o| {
                format!(
                    "{}: {}",
                    o.spec,
                    o.reason().unwrap_or_else(|| o.kind.label().to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Runs every configured task spec concurrently: submit, then wait.
///
/// Workers share nothing but the backend; a failing spec never cancels its siblings.
pub struct Orchestrator {
    submitter: Arc<TaskSubmitter>,
    monitor: Arc<TaskMonitor>,
    metrics: MetricsHandle,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn TaskBackend>, cfg: OrchestratorConfig) -> Self {
        Self::with_metrics(backend, cfg, noop_metrics())
    }

    pub fn with_metrics(
        backend: Arc<dyn TaskBackend>,
        cfg: OrchestratorConfig,
        metrics: MetricsHandle,
    ) -> Self {
        let submitter =
            TaskSubmitter::new(Arc::clone(&backend), cfg.retry).with_metrics(Arc::clone(&metrics));
        let monitor = TaskMonitor::new(backend, cfg.monitor);

        Self {
            submitter: Arc::new(submitter),
            monitor: Arc::new(monitor),
            metrics,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token; firing it interrupts every worker's waits.
    #[inline]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[inline]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Parse `raw` and run all resulting specs.
    ///
    /// A configuration without valid entries is a successful no-op.
    /// Fails with the full report when any spec did not succeed.
    #[instrument(level = "info", skip(self, raw))]
    pub async fn run_all(&self, raw: &str) -> Result<RunReport, OrchestratorError> {
        let specs = parse_task_specs(raw);
        if specs.is_empty() {
            warn!("no valid task specs configured; nothing to run");
            return Ok(RunReport::default());
        }

        let report = self.run_specs(specs).await;
        if report.is_success() {
            info!(tasks = report.outcomes.len(), "all tasks succeeded");
            Ok(report)
        } else {
            Err(OrchestratorError::TasksFailed(report))
        }
    }

    /// Launch one worker per spec and collect exactly one outcome for each.
    pub async fn run_specs(&self, specs: Vec<TaskSpec>) -> RunReport {
        let total = specs.len();
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, TaskOutcome)>();

        for (idx, spec) in specs.iter().cloned().enumerate() {
            let tx = tx.clone();
            let submitter = Arc::clone(&self.submitter);
            let monitor = Arc::clone(&self.monitor);
            let metrics = Arc::clone(&self.metrics);
            let cancel = self.cancel.clone();

            tokio::spawn(async move {
                let started = Instant::now();
                let cluster = spec.cluster_id.clone();
                let outcome = drive(&submitter, &monitor, spec, &cancel).await;

                metrics.record_outcome(&cluster, &outcome.kind, started.elapsed());
                let _ = tx.send((idx, outcome));
            });
        }
        drop(tx);
        info!(tasks = total, "launched all task workers");

        let mut slots: Vec<Option<TaskOutcome>> = vec![None; total];
        while let Some((idx, outcome)) = rx.recv().await {
            if outcome.is_success() {
                info!(task = %outcome.spec, "task finished");
            } else {
                error!(
                    task = %outcome.spec,
                    outcome = outcome.kind.label(),
                    reason = %outcome.reason().unwrap_or_default(),
                    "task did not succeed"
                );
            }
            slots[idx] = Some(outcome);
        }

        let outcomes = slots
            .into_iter()
            .zip(specs)
            .map(|(slot, spec)| {
                slot.unwrap_or_else(|| {
                    error!(task = %spec, "worker terminated without reporting an outcome");
                    TaskOutcome::new(
                        spec,
                        None,
                        OutcomeKind::Aborted {
                            reason: "worker terminated without reporting an outcome".to_string(),
                        },
                    )
                })
            })
            .collect();

        RunReport { outcomes }
    }
}

async fn drive(
    submitter: &TaskSubmitter,
    monitor: &TaskMonitor,
    spec: TaskSpec,
    cancel: &CancellationToken,
) -> TaskOutcome {
    match submitter.submit(&spec, cancel).await {
        Ok(handle) => monitor.wait(spec, handle, cancel).await,
        Err(SubmissionError::Interrupted { .. }) => {
            TaskOutcome::new(spec, None, OutcomeKind::Interrupted)
        }
        Err(e) => TaskOutcome::new(
            spec,
            None,
            OutcomeKind::SubmissionFailed {
                reason: e.to_string(),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, sync::Mutex, time::Duration};

    use async_trait::async_trait;
    use lpad_model::{RunTaskRequest, TaskHandle, TaskStatus};

    use crate::{
        config::MonitorConfig, error::BackendError, metrics::MetricsBackend, retry::RetryPolicy,
        testing::ScriptedBackend,
    };

    const TWO_TASKS: &str =
        "test-cluster::test-task-def::subnet-1::sg-1| test-cluster-2::test-task-def-2::subnet-2::sg-2";

    fn orchestrator(backend: Arc<dyn TaskBackend>) -> Orchestrator {
        Orchestrator::new(backend, OrchestratorConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn all_tasks_succeed() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .statuses(
                    "test-cluster",
                    [TaskStatus::Running, TaskStatus::stopped(0)],
                )
                .statuses("test-cluster-2", [TaskStatus::stopped(0)]),
        );

        let report = orchestrator(backend.clone())
            .run_all(TWO_TASKS)
            .await
            .expect("both tasks succeed");

        assert!(report.is_success());
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].spec.cluster_id, "test-cluster");
        assert_eq!(report.outcomes[1].spec.cluster_id, "test-cluster-2");

        let launched: HashSet<String> = backend
            .run_calls()
            .into_iter()
            .map(|(_, req)| format!("{}::{}", req.cluster, req.task_definition))
            .collect();
        assert_eq!(
            launched,
            HashSet::from([
                "test-cluster::test-task-def".to_string(),
                "test-cluster-2::test-task-def-2".to_string(),
            ])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_fails_run_but_both_are_launched() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .statuses("test-cluster", [TaskStatus::stopped(0)])
                .statuses(
                    "test-cluster-2",
                    [TaskStatus::stopped_with_reason(1, "Exit 1")],
                ),
        );

        let err = orchestrator(backend.clone())
            .run_all(TWO_TASKS)
            .await
            .unwrap_err();

        assert_eq!(backend.run_calls().len(), 2);

        let report = err.report();
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.succeeded().count(), 1);
        assert!(err.to_string().contains("Exit 1"));
        assert!(err.to_string().contains("test-cluster-2/test-task-def-2"));
    }

    #[tokio::test(start_paused = true)]
    async fn reports_every_failure() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .statuses("test-cluster", [TaskStatus::stopped_with_reason(2, "oom")])
                .fail_submits(
                    "test-cluster-2",
                    (0..5).map(|_| BackendError::Rejected("bad subnet".into())),
                ),
        );

        let err = orchestrator(backend.clone())
            .run_all(TWO_TASKS)
            .await
            .unwrap_err();

        let kinds: Vec<&'static str> = err.report().failed().map(|o| o.kind.label()).collect();
        assert_eq!(kinds, vec!["failed", "submission_failed"]);
        assert_eq!(backend.run_calls().len(), 1 + 5);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_config_is_a_noop() {
        let backend = Arc::new(ScriptedBackend::new());

        let report = orchestrator(backend.clone())
            .run_all("invalid-config")
            .await
            .expect("nothing to run is not an error");

        assert!(report.outcomes.is_empty());
        assert!(backend.run_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn workers_run_concurrently() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .statuses(
                    "test-cluster",
                    [
                        TaskStatus::Running,
                        TaskStatus::Running,
                        TaskStatus::stopped(0),
                    ],
                )
                .statuses(
                    "test-cluster-2",
                    [
                        TaskStatus::Running,
                        TaskStatus::Running,
                        TaskStatus::stopped(0),
                    ],
                ),
        );
        let start = Instant::now();

        orchestrator(backend.clone())
            .run_all(TWO_TASKS)
            .await
            .unwrap();

        // sequential execution would need 40s
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_all_workers() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .statuses("test-cluster", [TaskStatus::Running])
                .statuses("test-cluster-2", [TaskStatus::Pending]),
        );
        let orchestrator = orchestrator(backend.clone());
        let cancel = orchestrator.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(25)).await;
            cancel.cancel();
        });

        let err = orchestrator.run_all(TWO_TASKS).await.unwrap_err();

        assert!(
            err.report()
                .outcomes
                .iter()
                .all(|o| o.kind == OutcomeKind::Interrupted)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_run_launches_nothing() {
        let backend = Arc::new(ScriptedBackend::new());
        let orchestrator = orchestrator(backend.clone());
        orchestrator.cancellation_token().cancel();

        let err = orchestrator.run_all(TWO_TASKS).await.unwrap_err();

        assert!(backend.run_calls().is_empty());
        assert!(backend.describe_calls().is_empty());
        assert!(err.report().outcomes.iter().all(|o| {
            o.kind == OutcomeKind::Interrupted && o.handle.is_none()
        }));
    }

    struct PanickingBackend;

    #[async_trait]
    impl TaskBackend for PanickingBackend {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn run_task(&self, request: &RunTaskRequest) -> Result<TaskHandle, BackendError> {
            if request.cluster == "test-cluster" {
                panic!("backend bug");
            }
            Ok(TaskHandle::new("t-2", request.cluster.clone()))
        }

        async fn describe_task(&self, _handle: &TaskHandle) -> Result<TaskStatus, BackendError> {
            Ok(TaskStatus::stopped(0))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_worker_still_yields_an_outcome() {
        let err = orchestrator(Arc::new(PanickingBackend))
            .run_all(TWO_TASKS)
            .await
            .unwrap_err();

        let outcomes = &err.report().outcomes;
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0].kind, OutcomeKind::Aborted { .. }));
        assert!(outcomes[1].is_success());
    }

    #[derive(Default)]
    struct RecordingMetrics {
        outcomes: Mutex<Vec<(String, &'static str)>>,
        attempts: Mutex<u32>,
    }

    impl MetricsBackend for RecordingMetrics {
        fn record_submit_attempt(&self, _cluster: &str) {
            *self.attempts.lock().unwrap() += 1;
        }
        fn record_submit_failure(&self, _cluster: &str) {}
        fn record_outcome(&self, cluster: &str, outcome: &OutcomeKind, _elapsed: Duration) {
            self.outcomes
                .lock()
                .unwrap()
                .push((cluster.to_string(), outcome.label()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn records_metrics_per_spec() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .statuses("test-cluster", [TaskStatus::stopped(0)])
                .statuses("test-cluster-2", [TaskStatus::Running]),
        );
        let metrics = Arc::new(RecordingMetrics::default());
        let cfg = OrchestratorConfig {
            retry: RetryPolicy::default(),
            monitor: MonitorConfig {
                poll_interval_ms: 1_000,
                max_polls: 3,
            },
        };

        let _ = Orchestrator::with_metrics(backend, cfg, metrics.clone())
            .run_all(TWO_TASKS)
            .await;

        let mut outcomes = metrics.outcomes.lock().unwrap().clone();
        outcomes.sort();
        assert_eq!(
            outcomes,
            vec![
                ("test-cluster".to_string(), "succeeded"),
                ("test-cluster-2".to_string(), "timed_out"),
            ]
        );
        assert_eq!(*metrics.attempts.lock().unwrap(), 2);
    }
}
