//! Prometheus metrics backend for the launchpad orchestrator.
//!
//! [`PrometheusMetrics`] implements [`lpad_core::MetricsBackend`] and keeps its collectors in a
//! private [`Registry`]. This crate does not serve `/metrics`; call [`PrometheusMetrics::gather`]
//! or [`PrometheusMetrics::render`] from whatever surface the host process exposes.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use lpad_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: lpad_core::MetricsHandle = Arc::new(metrics.clone());
//! // Orchestrator::with_metrics(backend, cfg, handle)
//! # let _ = handle;
//! let text = metrics.render()?;
//! assert!(text.is_empty() || text.contains("lpad_"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `lpad_submit_attempts_total{cluster}` - Counter
//! - `lpad_submit_failures_total{cluster}` - Counter
//! - `lpad_tasks_finished_total{cluster, outcome}` - Counter
//! - `lpad_task_duration_seconds{cluster}` - Histogram

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
