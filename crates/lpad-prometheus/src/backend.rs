use std::time::Duration;

use lpad_core::MetricsBackend;
use lpad_model::OutcomeKind;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

/// Migration tasks usually run for minutes, so buckets go up to the default 10-minute budget.
const DURATION_BUCKETS: &[f64] = &[1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 900.0];

#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    submit_attempts: IntCounterVec,
    submit_failures: IntCounterVec,
    tasks_finished: IntCounterVec,
    task_duration: HistogramVec,
}

impl PrometheusMetrics {
    /// Create collectors in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Register collectors in an existing registry (e.g. one shared with other components).
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let submit_attempts = IntCounterVec::new(
            Opts::new("lpad_submit_attempts_total", "Task launch calls sent to the backend"),
            &["cluster"],
        )?;
        let submit_failures = IntCounterVec::new(
            Opts::new(
                "lpad_submit_failures_total",
                "Task specs whose launch gave up after retries",
            ),
            &["cluster"],
        )?;
        let tasks_finished = IntCounterVec::new(
            Opts::new("lpad_tasks_finished_total", "Task specs that reached a final outcome"),
            &["cluster", "outcome"],
        )?;
        let task_duration = HistogramVec::new(
            HistogramOpts::new(
                "lpad_task_duration_seconds",
                "Wall time from first launch attempt to final outcome",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
            &["cluster"],
        )?;

        registry.register(Box::new(submit_attempts.clone()))?;
        registry.register(Box::new(submit_failures.clone()))?;
        registry.register(Box::new(tasks_finished.clone()))?;
        registry.register(Box::new(task_duration.clone()))?;

        Ok(Self {
            registry,
            submit_attempts,
            submit_failures,
            tasks_finished,
            task_duration,
        })
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[inline]
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Text exposition format of everything gathered so far.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_submit_attempt(&self, cluster: &str) {
        self.submit_attempts.with_label_values(&[cluster]).inc();
    }

    fn record_submit_failure(&self, cluster: &str) {
        self.submit_failures.with_label_values(&[cluster]).inc();
    }

    fn record_outcome(&self, cluster: &str, outcome: &OutcomeKind, elapsed: Duration) {
        self.tasks_finished
            .with_label_values(&[cluster, outcome.label()])
            .inc();
        self.task_duration
            .with_label_values(&[cluster])
            .observe(elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_attempts_and_outcomes_per_cluster() {
        let m = PrometheusMetrics::new().unwrap();

        m.record_submit_attempt("c1");
        m.record_submit_attempt("c1");
        m.record_submit_failure("c2");
        m.record_outcome("c1", &OutcomeKind::Succeeded, Duration::from_secs(42));
        m.record_outcome(
            "c2",
            &OutcomeKind::SubmissionFailed {
                reason: "down".into(),
            },
            Duration::from_secs(30),
        );

        assert_eq!(m.submit_attempts.with_label_values(&["c1"]).get(), 2);
        assert_eq!(m.submit_failures.with_label_values(&["c2"]).get(), 1);
        assert_eq!(
            m.tasks_finished
                .with_label_values(&["c2", "submission_failed"])
                .get(),
            1
        );
        assert_eq!(
            m.task_duration
                .with_label_values(&["c1"])
                .get_sample_count(),
            1
        );
    }

    #[test]
    fn render_exposes_metric_names() {
        let m = PrometheusMetrics::new().unwrap();
        m.record_outcome("c1", &OutcomeKind::TimedOut { polls: 60 }, Duration::from_secs(600));

        let text = m.render().unwrap();
        assert!(text.contains("lpad_tasks_finished_total"));
        assert!(text.contains(r#"outcome="timed_out""#));
        assert!(text.contains("lpad_task_duration_seconds_bucket"));
    }

    #[test]
    fn shared_registry_rejects_duplicate_registration() {
        let registry = Registry::new();
        assert!(PrometheusMetrics::with_registry(registry.clone()).is_ok());
        assert!(PrometheusMetrics::with_registry(registry).is_err());
    }
}
