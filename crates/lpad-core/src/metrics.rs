use std::{sync::Arc, time::Duration};

use lpad_model::OutcomeKind;

/// Sink for orchestration metrics.
///
/// Implementations must be cheap and non-blocking; they are called from worker tasks.
pub trait MetricsBackend: Send + Sync {
    /// One call to the backend's launch operation.
    fn record_submit_attempt(&self, cluster: &str);

    /// A spec whose submission gave up.
    fn record_submit_failure(&self, cluster: &str);

    /// Final outcome of a spec, with the wall time of its whole lifecycle.
    fn record_outcome(&self, cluster: &str, outcome: &OutcomeKind, elapsed: Duration);
}

pub type MetricsHandle = Arc<dyn MetricsBackend>;

/// Metrics backend that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsBackend for NoopMetrics {
    fn record_submit_attempt(&self, _cluster: &str) {}
    fn record_submit_failure(&self, _cluster: &str) {}
    fn record_outcome(&self, _cluster: &str, _outcome: &OutcomeKind, _elapsed: Duration) {}
}

#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoopMetrics)
}
