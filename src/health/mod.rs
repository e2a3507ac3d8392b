//! Health subsystem.
//!
//! # Endpoints
//! - `GET /health`: liveness, uptime, environment and version
//! - `GET /api/status`: one-shot CRM probe with its own short deadline
//!
//! # Design Decisions
//! - Liveness never depends on the upstream
//! - A failed probe still answers 200 when the upstream responded; 503 only
//!   when it could not be reached

pub mod handlers;

pub use handlers::{api_status, health};
