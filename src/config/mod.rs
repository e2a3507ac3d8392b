//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: credential, board, port)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared through the AppState handed to every handler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Credentials are `Secret`s and never print

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ClientRateLimitConfig, ContactConfig, ContentConfig, Environment, GatewayConfig, ListenerConfig,
    LogFormat, ObservabilityConfig, RateLimitConfig, RetryConfig, Secret, SecurityConfig,
    TimeoutConfig, UpstreamConfig,
};
