//! CRM gateway endpoint.
//!
//! # Data Flow
//! ```text
//! POST /monday {query, variables?}
//!     → outbound.rs (INVALID_QUERY / EMPTY_QUERY, sanitize variables)
//!     → security::rate_limit (CRM budget, one unit per request)
//!     → resilience::retries (capped backoff, fail fast on deterministic kinds)
//!     → upstream::crm (credential, deadline, classification)
//!     → 200 with the upstream body, or the mapped error envelope
//! ```
//!
//! # Design Decisions
//! - The caller never supplies or sees the credential
//! - Only variables are sanitized; the document is trimmed and sent as is
//! - One log line per request: request ID, client IP, elapsed time, outcome

pub mod handler;
pub mod outbound;

pub use handler::{execute_crm, monday_handler};
pub use outbound::{OutboundRequest, QueryRejection};
