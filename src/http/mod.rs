//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, per-request outcome line)
//!     → gateway / contact / content / health handlers
//!     → response.rs (error envelope, status mapping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, RequestContext, X_REQUEST_ID};
pub use response::{ErrorBody, ErrorResponse};
pub use server::{AppState, HttpServer};
