//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check credential and board identifier formats
//! - Validate value ranges (timeouts > 0, limits > 0, URLs parse)
//! - Check the request deadline covers every attempt plus backoff
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("upstream API key is missing")]
    MissingApiKey,
    #[error("upstream API key must be at least 32 alphanumeric characters")]
    InvalidApiKey,
    #[error("board id must be numeric, got '{0}'")]
    InvalidBoardId(String),
    #[error("content API key must be at least 20 alphanumeric characters")]
    InvalidContentKey,
    #[error("{field} is not a valid URL: '{value}'")]
    InvalidUrl { field: &'static str, value: String },
    #[error("{field} is not a valid socket address: '{value}'")]
    InvalidAddress { field: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("timeouts.request_secs ({request_secs}) must be at least {required_secs} to cover every retry attempt")]
    RequestDeadlineTooShort { request_secs: u64, required_secs: u64 },
}

/// Whether `key` looks like a usable upstream credential.
pub fn is_valid_api_key(key: &str, min_len: usize) -> bool {
    key.len() >= min_len && key.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Seconds an inbound request may need when every attempt times out and
/// every backoff hits its cap.
pub fn worst_case_request_secs(config: &GatewayConfig) -> u64 {
    let attempts = config.retries.max_attempts as u64;
    let backoff_ms = attempts.saturating_sub(1) * (config.retries.max_delay_ms + config.retries.max_jitter_ms);
    attempts * config.timeouts.upstream_secs + backoff_ms.div_ceil(1000)
}

/// Validate the whole configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let api_key = config.upstream.api_key.expose();
    if api_key.is_empty() {
        errors.push(ValidationError::MissingApiKey);
    } else if !is_valid_api_key(api_key, 32) {
        errors.push(ValidationError::InvalidApiKey);
    }

    let board_id = &config.upstream.board_id;
    if board_id.is_empty() || !board_id.chars().all(|c| c.is_ascii_digit()) {
        errors.push(ValidationError::InvalidBoardId(board_id.clone()));
    }

    check_url(&mut errors, "upstream.url", &config.upstream.url);
    check_url(&mut errors, "content.url", &config.content.url);

    if let Some(key) = &config.content.api_key {
        if !is_valid_api_key(key.expose(), 20) {
            errors.push(ValidationError::InvalidContentKey);
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let positive = [
        ("rate_limit.crm_limit", config.rate_limit.crm_limit as u64),
        ("rate_limit.content_limit", config.rate_limit.content_limit as u64),
        ("rate_limit.window_secs", config.rate_limit.window_secs),
        ("client_rate_limit.max_requests", config.client_rate_limit.max_requests as u64),
        ("client_rate_limit.window_secs", config.client_rate_limit.window_secs),
        ("retries.max_attempts", config.retries.max_attempts as u64),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("timeouts.probe_secs", config.timeouts.probe_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("content.default_limit", config.content.default_limit as u64),
        ("content.max_limit", config.content.max_limit as u64),
        ("contact.max_item_name", config.contact.max_item_name as u64),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    let required_secs = worst_case_request_secs(config);
    if config.timeouts.request_secs != 0 && config.timeouts.request_secs < required_secs {
        errors.push(ValidationError::RequestDeadlineTooShort {
            request_secs: config.timeouts.request_secs,
            required_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
