//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Deterministic part of the delay: `base * 2^(attempt-1)`, capped at `max`.
pub fn exponential_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let base_ms = base.as_millis() as u64;
    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    Duration::from_millis(delay_ms.min(max.as_millis() as u64))
}

/// Calculate exponential backoff delay with up to `max_jitter` of random jitter.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration, max_jitter: Duration) -> Duration {
    let delay = exponential_delay(attempt, base, max);
    if delay.is_zero() {
        return delay;
    }

    let jitter_range = max_jitter.as_millis() as u64;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..=jitter_range)
    } else {
        0
    };

    delay + Duration::from_millis(jitter)
}
