//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Deployment environment.
    pub environment: Environment,

    /// Upstream work-management (CRM) API.
    pub upstream: UpstreamConfig,

    /// Headless content API serving blog posts.
    pub content: ContentConfig,

    /// Per-target outbound rate limits.
    pub rate_limit: RateLimitConfig,

    /// Per-client inbound rate limit.
    pub client_rate_limit: ClientRateLimitConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Security headers, CORS and body limits.
    pub security: SecurityConfig,

    /// Lead-capture board layout.
    pub contact: ContactConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// A credential that never appears in logs or serialized output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value. Only the outbound clients should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret)
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4000".to_string(),
        }
    }
}

/// Upstream CRM API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// GraphQL endpoint URL.
    pub url: String,

    /// API credential sent as the `Authorization` header.
    pub api_key: Secret,

    /// Numeric board identifier that receives leads.
    pub board_id: String,

    /// Value of the `API-Version` header.
    pub api_version: String,

    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "https://api.monday.com/v2".to_string(),
            api_key: Secret::default(),
            board_id: String::new(),
            api_version: "2023-10".to_string(),
            user_agent: concat!("crm-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Headless content API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Posts collection URL (trailing slash included).
    pub url: String,

    /// Content API key. The posts routes are disabled when unset.
    pub api_key: Option<Secret>,

    /// Default page size for post listings.
    pub default_limit: u32,

    /// Largest page size a caller may request.
    pub max_limit: u32,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            url: "https://xelf.ghost.io/ghost/api/v3/content/posts/".to_string(),
            api_key: None,
            default_limit: 10,
            max_limit: 50,
        }
    }
}

/// Outbound rate limits, one sliding window per upstream target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests per window to the CRM API.
    pub crm_limit: u32,

    /// Requests per window to the content API.
    pub content_limit: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            crm_limit: 50,
            content_limit: 100,
            window_secs: 60,
        }
    }
}

/// Inbound per-client-IP rate limit.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientRateLimitConfig {
    /// Enable the per-client limit.
    pub enabled: bool,

    /// Requests allowed per client per window.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for ClientRateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per logical operation, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Upper bound of the random jitter added to each delay.
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            max_jitter_ms: 1000,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a single upstream call in seconds.
    pub upstream_secs: u64,

    /// Deadline for the `/api/status` probe in seconds.
    pub probe_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Whole inbound request deadline (covers retries) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 30,
            probe_secs: 10,
            connect_secs: 5,
            request_secs: 120,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,

    /// Maximum body size in bytes.
    pub max_body_size: usize,

    /// CORS origins. Falls back to per-environment defaults when unset.
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 10 * 1024 * 1024,
            allowed_origins: None,
        }
    }
}

impl SecurityConfig {
    /// Origins allowed by CORS for the given environment.
    pub fn origins_for(&self, environment: Environment) -> Vec<String> {
        if let Some(origins) = &self.allowed_origins {
            return origins.clone();
        }
        match environment {
            Environment::Production => vec!["https://soklaw.co.ke".to_string()],
            Environment::Development => vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

/// Column layout of the lead-capture board.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Group that new items land in. Board default when unset.
    pub group_id: Option<String>,

    pub email_column: String,
    pub phone_column: String,
    pub message_column: String,
    pub subject_column: String,

    /// Longest item name the board accepts.
    pub max_item_name: usize,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            group_id: None,
            email_column: "email".to_string(),
            phone_column: "phone".to_string(),
            message_column: "long_text".to_string(),
            subject_column: "text".to_string(),
            max_item_name: 255,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
