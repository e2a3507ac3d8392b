//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to an upstream API:
//!     → timeouts.rs (enforce the per-call deadline)
//!     → On failure: retries.rs (classified kind retryable? attempts left?)
//!     → backoff.rs (capped exponential delay + jitter before next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retry eligibility comes from the classified `ErrorKind`, not raw errors
//! - The delay function is injected so tests never sleep

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{execute_with_retry, RetryAttempt, RetryPolicy};
