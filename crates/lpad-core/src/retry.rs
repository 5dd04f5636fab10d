//! Explicit retry-with-backoff wrapper.
//!
//! Delay before attempt `n` (`n >= 2`) is `base_delay * multiplier^(n - 2)`, no jitter.
//! With the defaults (5 attempts, 2s, ×2) the pauses are 2s, 4s, 8s and 16s.

use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Pause before the second attempt.
    pub base_delay_ms: u64,
    /// Growth factor applied to the pause for each further attempt.
    pub multiplier: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts,
            base_delay_ms: base_delay.as_millis() as u64,
            multiplier,
        }
    }

    /// Pause to observe before `attempt` (1-based); `None` for the first attempt.
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        if attempt < 2 {
            return None;
        }
        let factor = self.multiplier.max(1.0).powi((attempt - 2) as i32);
        Some(Duration::from_millis(
            (self.base_delay_ms as f64 * factor) as u64,
        ))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 2_000,
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed; carries the error of the last one.
    Exhausted { attempts: u32, last: E },
    /// The token fired while waiting between attempts.
    Cancelled { attempts: u32 },
}

/// Run `op` until it succeeds or the policy runs out of attempts.
///
/// `op` receives the 1-based attempt number. A policy with `max_attempts == 0` still runs once.
/// Once `cancel` has fired no further attempt is started, including the first one.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        if cancel.is_cancelled() {
            debug!(attempt, "cancelled before attempt");
            return Err(RetryError::Cancelled {
                attempts: attempt - 1,
            });
        }

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => {
                warn!(attempt, max_attempts, error = %e, "giving up after last attempt");
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: e,
                });
            }
            Err(e) => {
                attempt += 1;
                let delay = policy.delay_before(attempt).unwrap_or_default();
                debug!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "attempt failed; retry scheduled"
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => {
                        return Err(RetryError::Cancelled { attempts: attempt - 1 });
                    }
                }
            }
        }
    }
}
