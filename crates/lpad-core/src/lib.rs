pub mod backend;
pub use backend::TaskBackend;

pub mod config;
pub use config::{MonitorConfig, OrchestratorConfig};

pub mod error;
pub use error::{BackendError, OrchestratorError, SubmissionError};

pub mod metrics;
pub use metrics::{MetricsBackend, MetricsHandle, NoopMetrics};

pub mod monitor;
pub use monitor::TaskMonitor;

pub mod orchestrator;
pub use orchestrator::{Orchestrator, RunReport};

pub mod retry;
pub use retry::{RetryError, RetryPolicy, retry};

pub mod submitter;
pub use submitter::TaskSubmitter;

#[cfg(test)]
mod testing;
