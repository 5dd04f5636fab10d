use std::str::FromStr;

use lpad_core::{MonitorConfig, OrchestratorConfig, RetryPolicy};
use lpad_observe::{LoggerConfig, LoggerError, LoggerFormat};
use thiserror::Error;

pub const TASK_CONFIGS: &str = "LPAD_TASK_CONFIGS";
pub const BACKEND: &str = "LPAD_BACKEND";
pub const BACKEND_ENDPOINT: &str = "LPAD_BACKEND_ENDPOINT";
pub const BACKEND_TOKEN: &str = "LPAD_BACKEND_TOKEN";
pub const PROC_COMMANDS: &str = "LPAD_PROC_COMMANDS";
pub const POLL_INTERVAL_MS: &str = "LPAD_POLL_INTERVAL_MS";
pub const MAX_POLLS: &str = "LPAD_MAX_POLLS";
pub const SUBMIT_ATTEMPTS: &str = "LPAD_SUBMIT_ATTEMPTS";
pub const SUBMIT_BASE_DELAY_MS: &str = "LPAD_SUBMIT_BASE_DELAY_MS";
pub const LOG_LEVEL: &str = "LPAD_LOG_LEVEL";
pub const LOG_FORMAT: &str = "LPAD_LOG_FORMAT";
pub const METRICS_DUMP: &str = "LPAD_METRICS_DUMP";

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("{var}: {source}")]
    Logger {
        var: &'static str,
        #[source]
        source: LoggerError,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Http,
    Proc,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(BackendKind::Http),
            "proc" | "local" => Ok(BackendKind::Proc),
            _ => Err("expected http or proc".to_string()),
        }
    }
}

/// Process configuration read from `LPAD_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub task_configs: String,
    pub backend: BackendKind,
    pub endpoint: Option<String>,
    pub auth_token: Option<String>,
    pub proc_commands: String,
    pub orchestrator: OrchestratorConfig,
    pub logger: LoggerConfig,
    pub metrics_dump: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build settings from any variable source; unset optional values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let task_configs = lookup(TASK_CONFIGS).ok_or(SettingsError::Missing(TASK_CONFIGS))?;

        let defaults = OrchestratorConfig::default();
        let orchestrator = OrchestratorConfig {
            retry: RetryPolicy {
                max_attempts: parse_or(&lookup, SUBMIT_ATTEMPTS, defaults.retry.max_attempts)?,
                base_delay_ms: parse_or(&lookup, SUBMIT_BASE_DELAY_MS, defaults.retry.base_delay_ms)?,
                ..defaults.retry
            },
            monitor: MonitorConfig {
                poll_interval_ms: parse_or(
                    &lookup,
                    POLL_INTERVAL_MS,
                    defaults.monitor.poll_interval_ms,
                )?,
                max_polls: parse_or(&lookup, MAX_POLLS, defaults.monitor.max_polls)?,
            },
        };

        let mut logger = LoggerConfig::default();
        if let Some(level) = lookup(LOG_LEVEL) {
            logger.level = level;
        }
        if let Some(format) = lookup(LOG_FORMAT) {
            logger.format = format
                .parse::<LoggerFormat>()
                .map_err(|source| SettingsError::Logger {
                    var: LOG_FORMAT,
                    source,
                })?;
        }

        let backend = match lookup(BACKEND) {
            Some(raw) => raw.parse::<BackendKind>().map_err(|reason| SettingsError::Invalid {
                var: BACKEND,
                value: raw,
                reason,
            })?,
            None => BackendKind::default(),
        };
        let endpoint = lookup(BACKEND_ENDPOINT).filter(|s| !s.trim().is_empty());
        if backend == BackendKind::Http && endpoint.is_none() {
            return Err(SettingsError::Missing(BACKEND_ENDPOINT));
        }

        Ok(Self {
            task_configs,
            backend,
            endpoint,
            auth_token: lookup(BACKEND_TOKEN).filter(|s| !s.is_empty()),
            proc_commands: lookup(PROC_COMMANDS).unwrap_or_default(),
            orchestrator,
            logger,
            metrics_dump: parse_or(&lookup, METRICS_DUMP, false)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, SettingsError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| SettingsError::Invalid {
            var,
            reason: e.to_string(),
            value: raw,
        }),
    }
}
