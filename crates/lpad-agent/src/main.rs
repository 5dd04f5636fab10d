use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use lpad_backend::{HttpBackend, HttpBackendConfig, ProcBackend};
use lpad_core::{Orchestrator, OrchestratorError, RunReport, TaskBackend};
use lpad_observe::logger_init;
use lpad_prometheus::PrometheusMetrics;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod settings;
use settings::{BackendKind, Settings};

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("lpad: {e}");
            return ExitCode::from(2);
        }
    };
    if let Err(e) = logger_init(&settings.logger) {
        eprintln!("lpad: {e}");
        return ExitCode::from(2);
    }

    match run(settings).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = ?e, "lpad aborted");
            ExitCode::from(2)
        }
    }
}

/// Returns whether every configured task succeeded.
async fn run(settings: Settings) -> anyhow::Result<bool> {
    let backend = build_backend(&settings)?;
    let metrics = Arc::new(PrometheusMetrics::new().context("registering metrics")?);
    info!(backend = backend.name(), "backend ready");

    let cancel = CancellationToken::new();
    let orchestrator =
        Orchestrator::with_metrics(backend, settings.orchestrator, metrics.clone())
            .with_cancellation(cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping waits");
            cancel.cancel();
        }
    });

    let result = orchestrator.run_all(&settings.task_configs).await;

    if settings.metrics_dump {
        print!("{}", metrics.render().context("rendering metrics")?);
    }

    match result {
        Ok(report) => {
            log_report(&report);
            Ok(true)
        }
        Err(OrchestratorError::TasksFailed(report)) => {
            log_report(&report);
            error!(
                failed = report.failed().count(),
                total = report.outcomes.len(),
                "{}",
                report.failure_summary()
            );
            Ok(false)
        }
    }
}

fn build_backend(settings: &Settings) -> anyhow::Result<Arc<dyn TaskBackend>> {
    let backend: Arc<dyn TaskBackend> = match settings.backend {
        BackendKind::Http => {
            let cfg = HttpBackendConfig {
                endpoint: settings.endpoint.clone().unwrap_or_default(),
                auth_token: settings.auth_token.clone(),
                ..Default::default()
            };
            Arc::new(HttpBackend::new(&cfg).context("building http backend")?)
        }
        BackendKind::Proc => Arc::new(
            ProcBackend::from_definitions(&settings.proc_commands)
                .context("parsing LPAD_PROC_COMMANDS")?,
        ),
    };
    Ok(backend)
}

fn log_report(report: &RunReport) {
    for outcome in &report.outcomes {
        let task_id = outcome.handle.as_ref().map(|h| h.id.as_str());
        if outcome.is_success() {
            info!(spec = %outcome.spec, task_id, "task succeeded");
        } else {
            warn!(
                spec = %outcome.spec,
                task_id,
                outcome = outcome.kind.label(),
                reason = %outcome.reason().unwrap_or_default(),
                "task did not succeed"
            );
        }
    }
}
