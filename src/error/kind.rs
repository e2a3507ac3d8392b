//! Error kinds and the classified error record.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Closed set of failure kinds surfaced by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Timeout,
    InvalidCredentials,
    InsufficientPermissions,
    InvalidResource,
    RateLimited,
    Server,
    Validation,
    Unknown,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 9] = [
        ErrorKind::Network,
        ErrorKind::Timeout,
        ErrorKind::InvalidCredentials,
        ErrorKind::InsufficientPermissions,
        ErrorKind::InvalidResource,
        ErrorKind::RateLimited,
        ErrorKind::Server,
        ErrorKind::Validation,
        ErrorKind::Unknown,
    ];

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Timeout => "TIMEOUT_ERROR",
            ErrorKind::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorKind::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            ErrorKind::InvalidResource => "INVALID_RESOURCE",
            ErrorKind::RateLimited => "RATE_LIMIT_EXCEEDED",
            ErrorKind::Server => "SERVER_ERROR",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Default user-facing message for this kind.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::Network => "Network connection error. Please try again.",
            ErrorKind::Timeout => "Request timed out. Please try again.",
            ErrorKind::InvalidCredentials => "Invalid API credentials.",
            ErrorKind::InsufficientPermissions => "Insufficient permissions to perform this action.",
            ErrorKind::InvalidResource => "The requested resource was not found.",
            ErrorKind::RateLimited => "Rate limit exceeded. Please wait before making more requests.",
            ErrorKind::Server => "Upstream server error. Please try again later.",
            ErrorKind::Validation => "Data validation failed. Please check your input.",
            ErrorKind::Unknown => "An unexpected error occurred. Please try again.",
        }
    }

    /// Whether a failure of this kind is worth another attempt.
    ///
    /// Credential, permission, missing-resource and validation failures are
    /// deterministic: repeating the call cannot change the outcome.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ErrorKind::InvalidCredentials
                | ErrorKind::InsufficientPermissions
                | ErrorKind::InvalidResource
                | ErrorKind::Validation
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Where a failure was first observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOrigin {
    /// The outbound call never produced a response.
    Transport,
    /// The upstream answered with a non-2xx status.
    UpstreamStatus(u16),
    /// The upstream answered 2xx with a GraphQL `errors` list.
    GraphQl,
    /// The upstream answered with a body that is not JSON.
    MalformedResponse,
    /// Rejected by the gateway itself before or after the upstream call.
    Gateway,
}

/// A classified failure. Created once at the boundary, never persisted.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub raw_details: Value,
    pub occurred_at: DateTime<Utc>,
    pub source_endpoint: String,
    pub origin: FailureOrigin,
    /// Caller-facing hint for rate-limited requests.
    pub retry_after: Option<Duration>,
}

impl ApiError {
    /// Build an error with the kind's default message.
    pub fn new(kind: ErrorKind, origin: FailureOrigin, endpoint: impl Into<String>) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
            raw_details: Value::Null,
            occurred_at: Utc::now(),
            source_endpoint: endpoint.into(),
            origin,
            retry_after: None,
        }
    }

    /// Gateway-local error (validation, local rate limit, missing data).
    pub fn local(kind: ErrorKind, message: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(kind, FailureOrigin::Gateway, endpoint).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.raw_details = details;
        self
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Upstream HTTP status, when the upstream produced one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self.origin {
            FailureOrigin::UpstreamStatus(status) => Some(status),
            _ => None,
        }
    }

    /// The GraphQL `errors` array carried in the raw details, if any.
    pub fn graphql_errors(&self) -> Option<&Vec<Value>> {
        match self.origin {
            FailureOrigin::GraphQl => self.raw_details.get("errors").and_then(Value::as_array),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<_> = ErrorKind::ALL.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn test_serializes_as_code() {
        for kind in ErrorKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.code());
        }
    }

    #[test]
    fn test_retryable_split() {
        let retryable: Vec<_> = ErrorKind::ALL.iter().filter(|k| k.is_retryable()).copied().collect();
        assert_eq!(
            retryable,
            vec![
                ErrorKind::Network,
                ErrorKind::Timeout,
                ErrorKind::RateLimited,
                ErrorKind::Server,
                ErrorKind::Unknown,
            ]
        );
    }

    #[test]
    fn test_local_error_overrides_message() {
        let err = ApiError::local(ErrorKind::Validation, "Item name is required", "contact");
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.message, "Item name is required");
        assert_eq!(err.origin, FailureOrigin::Gateway);
        assert!(err.upstream_status().is_none());
        assert_eq!(err.to_string(), "VALIDATION_ERROR: Item name is required");
    }
}
