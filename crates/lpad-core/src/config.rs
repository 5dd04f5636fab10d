use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Poll cadence and budget for waiting on a launched task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorConfig {
    /// Pause between two status queries.
    pub poll_interval_ms: u64,
    /// Maximum number of status queries before giving up.
    pub max_polls: u32,
}

impl MonitorConfig {
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Upper bound on the time spent waiting, ignoring backend latency.
    pub fn budget(&self) -> Duration {
        self.poll_interval() * self.max_polls.saturating_sub(1)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10_000,
            max_polls: 60,
        }
    }
}

/// Everything the orchestrator needs besides the backend itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorConfig {
    pub retry: RetryPolicy,
    pub monitor: MonitorConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_give_ten_minute_budget() {
        let cfg = OrchestratorConfig::default();
        assert_eq!(cfg.monitor.poll_interval(), Duration::from_secs(10));
        assert_eq!(cfg.monitor.max_polls, 60);
        assert_eq!(cfg.retry.max_attempts, 5);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: OrchestratorConfig =
            serde_json::from_str(r#"{"monitor":{"maxPolls":3}}"#).unwrap();
        assert_eq!(cfg.monitor.max_polls, 3);
        assert_eq!(cfg.monitor.poll_interval_ms, 10_000);
        assert_eq!(cfg.retry, RetryPolicy::default());
    }
}
