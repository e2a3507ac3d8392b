//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Shutdown (shutdown.rs):
//!     Broadcast → server stops accepting, drains in-flight requests
//!              → background tasks (client window purge) exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; every long-running task subscribes
//! - In-flight requests are bounded by the request timeout, so draining ends

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
