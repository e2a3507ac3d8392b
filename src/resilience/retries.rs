//! Retry logic.
//!
//! # Responsibilities
//! - Decide from the classified kind whether a failure is retryable
//! - Execute retries with capped exponential backoff + jitter
//! - Bound the total number of attempts
//!
//! # Design Decisions
//! - Credential, permission, missing-resource and validation failures fail fast
//! - Jittered backoff prevents thundering herd
//! - Explicit loop with a bounded counter; the delay is an injected function

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::ApiError;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;

/// Backoff parameters for one logical operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
        }
    }
}

/// A scheduled retry: which attempt just failed and how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    pub attempt_number: u32,
    pub delay_before_next: Duration,
}

impl RetryPolicy {
    /// Run `operation` under this policy, sleeping on the Tokio timer.
    pub async fn execute<T, Op, Fut>(&self, operation: Op) -> Result<T, ApiError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        execute_with_retry(self, operation, |attempt: RetryAttempt| {
            tokio::time::sleep(attempt.delay_before_next)
        })
        .await
    }
}

/// Invoke `operation` until it succeeds, fails with a non-retryable kind, or
/// `policy.max_attempts` is exhausted. `delay` is awaited between attempts.
pub async fn execute_with_retry<T, Op, Fut, D, DFut>(
    policy: &RetryPolicy,
    mut operation: Op,
    mut delay: D,
) -> Result<T, ApiError>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    D: FnMut(RetryAttempt) -> DFut,
    DFut: Future<Output = ()>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() {
            tracing::debug!(attempt, code = err.code(), "Non-retryable failure, giving up");
            return Err(err);
        }

        if attempt >= max_attempts {
            tracing::warn!(attempt, code = err.code(), "Retry attempts exhausted");
            return Err(err);
        }

        let scheduled = RetryAttempt {
            attempt_number: attempt,
            delay_before_next: calculate_backoff(attempt, policy.base_delay, policy.max_delay, policy.max_jitter),
        };
        tracing::info!(
            attempt,
            delay_ms = scheduled.delay_before_next.as_millis() as u64,
            code = err.code(),
            "Retrying upstream call"
        );
        metrics::record_retry(err.code());
        delay(scheduled).await;
    }
}
