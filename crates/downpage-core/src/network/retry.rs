//! Bounded retry with exponential backoff.
//!
//! Every accessor operation is a read, so any of them may be retried. Only
//! errors the caller's predicate accepts are retried, and never more than
//! `max_retries` times after the first attempt.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
    /// Whether to scale delays by a random factor in `[0.5, 1.5)`.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: crate::config::NetworkConfig::MAX_RETRIES,
            base_delay: crate::config::NetworkConfig::RETRY_BASE_DELAY,
            max_delay: crate::config::NetworkConfig::RETRY_MAX_DELAY,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Total attempts allowed, first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (0 = first retry).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2f64.powi(retry.min(30) as i32);
        let capped = (self.base_delay.as_secs_f64() * factor).min(self.max_delay.as_secs_f64());

        let secs = if self.jitter {
            let scale = rand::rng().random_range(0.5..1.5);
            (capped * scale).min(self.max_delay.as_secs_f64())
        } else {
            capped
        };

        Duration::from_secs_f64(secs)
    }
}

/// Statistics about a retried operation.
#[derive(Debug, Clone, Default)]
pub struct RetryStats {
    /// Attempts made, first one included.
    pub attempts: u32,
    /// Time spent sleeping between attempts.
    pub total_delay: Duration,
    pub success: bool,
    pub last_error: Option<String>,
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent.
pub async fn retry_async<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
    should_retry: impl Fn(&E) -> bool,
) -> (Result<T, E>, RetryStats)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut stats = RetryStats::default();
    let mut retry = 0;

    loop {
        stats.attempts += 1;

        let err = match operation().await {
            Ok(value) => {
                stats.success = true;
                if retry > 0 {
                    debug!("Operation succeeded after {} attempts", stats.attempts);
                }
                return (Ok(value), stats);
            }
            Err(e) => e,
        };
        stats.last_error = Some(err.to_string());

        if !should_retry(&err) {
            debug!("Error is not retryable: {}", err);
            return (Err(err), stats);
        }
        if retry >= config.max_retries {
            if config.max_retries > 0 {
                warn!(
                    "Retry budget of {} exhausted. Last error: {}",
                    config.max_retries, err
                );
            }
            return (Err(err), stats);
        }

        let delay = config.delay_for(retry);
        stats.total_delay += delay;
        warn!(
            "Attempt {}/{} failed: {}. Retrying in {:?}",
            stats.attempts,
            config.max_attempts(),
            err,
            delay
        );
        tokio::time::sleep(delay).await;
        retry += 1;
    }
}
