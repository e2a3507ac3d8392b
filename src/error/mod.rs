//! Error taxonomy subsystem.
//!
//! # Data Flow
//! ```text
//! Raw failure observed at the boundary:
//!     reqwest error / non-2xx response / GraphQL error list / bad content type
//!     → classify.rs (RawFailure → ApiError, first match wins)
//!     → kind.rs (closed ErrorKind set, stable codes, default messages)
//!     → callers receive the classified ApiError only
//! ```
//!
//! # Design Decisions
//! - Classification happens once, where the raw failure is first seen
//! - Callers above the boundary match on `ErrorKind`, never on raw errors
//! - Codes and default messages are table-driven; messages may be overridden

pub mod classify;
pub mod kind;

pub use classify::{classify, RawFailure};
pub use kind::{ApiError, ErrorKind, FailureOrigin};
