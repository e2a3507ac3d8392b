//! CRM gateway library.

pub mod config;
pub mod contact;
pub mod content;
pub mod error;
pub mod gateway;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod upstream;

pub use config::schema::GatewayConfig;
pub use error::{ApiError, ErrorKind};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
