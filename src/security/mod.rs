//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-client window, 429 on excess)
//!     → handler
//!         → validation.rs (email, phone, slug shape checks)
//!         → sanitize.rs (strip markup from variables)
//!         → rate_limit.rs (per-target outbound window)
//!     → headers.rs (CSP, nosniff, frame and referrer policy, CORS)
//! ```
//!
//! # Design Decisions
//! - Outbound limits are local: they protect the upstream quota, not the gateway
//! - Sanitizing never fails; validation rejects with `VALIDATION_ERROR`
//! - Response headers never override what a handler set

pub mod headers;
pub mod rate_limit;
pub mod sanitize;
pub mod validation;

pub use rate_limit::{ApiTarget, ClientRateLimiter, RateLimited, RateLimiter};
pub use sanitize::sanitize;
