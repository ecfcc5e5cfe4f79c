//! Retry with exponential backoff
//!
//! Generic retry helper for transient storage failures (DB timeouts,
//! dropped connections). Wraps the ledger writes where a single blip
//! should not fail a guard's exit scan or an admin confirmation.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one).
    pub max_attempts: u32,
    /// Initial delay between retries.
    #[serde(with = "millis")]
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_multiplier: f64,
    /// Maximum delay between retries (cap).
    #[serde(with = "millis")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Execute an async operation with exponential backoff retry.
///
/// The `should_retry` closure determines whether a given error is transient
/// (and therefore retryable) or permanent (bail immediately).
///
/// # Example
/// ```ignore
/// let session = retry_with_backoff(
///     self.retry.clone(),
///     || self.repos.ledger().close_session(&closed, debit),
///     DomainError::is_transient,
///     "close_session",
/// ).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: RetryConfig,
    mut operation: F,
    should_retry: impl Fn(&E) -> bool,
    operation_name: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = config.initial_delay;
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(
                        operation = operation_name,
                        attempt,
                        "Succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => {
                if attempt >= max_attempts || !should_retry(&err) {
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Operation failed permanently"
                    );
                    return Err(err);
                }

                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "Transient failure, retrying"
                );

                tokio::time::sleep(delay).await;

                let next = (delay.as_secs_f64() * config.backoff_multiplier)
                    .min(config.max_delay.as_secs_f64());
                delay = if next.is_finite() && next > 0.0 {
                    Duration::from_secs_f64(next)
                } else {
                    Duration::ZERO
                };
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff(
            fast(),
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err("blip".to_string())
                } else {
                    Ok(n)
                }
            },
            |_| true,
            "test",
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            fast(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("not found".to_string())
            },
            |_| false,
            "test",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            fast(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("still down".to_string())
            },
            |_| true,
            "test",
        )
        .await;

        assert_eq!(result, Err("still down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn bad_multiplier_does_not_break_backoff() {
        for multiplier in [-1.0, f64::NAN] {
            let calls = AtomicU32::new(0);
            let config = RetryConfig {
                backoff_multiplier: multiplier,
                ..fast()
            };
            let result: Result<(), String> = retry_with_backoff(
                config,
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("still down".to_string())
                },
                |_| true,
                "test",
            )
            .await;

            assert!(result.is_err());
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }
    }

    #[test]
    fn config_reads_millis_from_toml() {
        let cfg: RetryConfig = toml::from_str("max_attempts = 5\ninitial_delay = 50").unwrap();
        assert_eq!(cfg.max_attempts, 5);
        assert_eq!(cfg.initial_delay, Duration::from_millis(50));
        assert_eq!(cfg.max_delay, Duration::from_secs(5));
    }
}
