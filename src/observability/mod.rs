//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, details redacted)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty in development, JSON in production)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - One structured line per inbound request, carrying the request ID
//! - Upstream payloads pass through `redact_value` before they are logged
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
