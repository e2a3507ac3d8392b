//! Failure classification.
//!
//! # Order (first match wins)
//! 1. Transport failure flagged as timeout → `Timeout`
//! 2. Any other transport failure → `Network`
//! 3. Structured error list → substring hints on the first message
//! 4. HTTP status table → 401/403/429/5xx, otherwise `Unknown`
//! 5. Fallback → `Unknown`
//!
//! A non-2xx status listed in the table is authoritative: a 401 is always
//! `InvalidCredentials` whatever the body says. Unlisted statuses still get
//! their body inspected before falling back to `Unknown`.

use serde_json::Value;

use crate::error::kind::{ApiError, ErrorKind, FailureOrigin};

const RESOURCE_KEYWORDS: [&str; 7] = ["board", "item", "column", "group", "workspace", "resource", "user"];

/// A failure as first observed, before classification.
#[derive(Debug, Clone)]
pub enum RawFailure {
    /// The request never produced a response.
    Transport { message: String, timed_out: bool },
    /// Non-2xx response. `body` is the parsed JSON body or `Null`.
    Status { status: u16, status_text: String, body: Value },
    /// 2xx response whose body carries an `errors` array.
    GraphQl { body: Value },
    /// 2xx response that is not JSON.
    Malformed { status: u16, content_type: Option<String> },
    /// Anything else.
    Other { message: String },
}

impl RawFailure {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        RawFailure::Transport {
            message: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }
}

/// Map a raw failure to exactly one classified error.
pub fn classify(failure: &RawFailure, endpoint: &str) -> ApiError {
    match failure {
        RawFailure::Transport { message, timed_out } => {
            let kind = if *timed_out || message.to_lowercase().contains("timed out") {
                ErrorKind::Timeout
            } else {
                ErrorKind::Network
            };
            ApiError::new(kind, FailureOrigin::Transport, endpoint)
                .with_details(Value::String(message.clone()))
        }
        RawFailure::GraphQl { body } => {
            let (kind, first_message) = classify_error_list(body).unwrap_or((ErrorKind::Validation, ""));
            let message = if first_message.is_empty() {
                kind.default_message().to_string()
            } else {
                first_message.to_string()
            };
            ApiError::new(kind, FailureOrigin::GraphQl, endpoint)
                .with_message(message)
                .with_details(body.clone())
        }
        RawFailure::Status { status, status_text, body } => {
            let origin = FailureOrigin::UpstreamStatus(*status);
            if let Some(kind) = status_kind(*status) {
                return ApiError::new(kind, origin, endpoint).with_details(body.clone());
            }
            if let Some((kind, first_message)) = classify_error_list(body) {
                let message = if kind == ErrorKind::Validation && !first_message.is_empty() {
                    first_message.to_string()
                } else {
                    kind.default_message().to_string()
                };
                return ApiError::new(kind, origin, endpoint)
                    .with_message(message)
                    .with_details(body.clone());
            }
            let reason = if status_text.is_empty() {
                ErrorKind::Unknown.default_message()
            } else {
                status_text.as_str()
            };
            ApiError::new(ErrorKind::Unknown, origin, endpoint)
                .with_message(format!("HTTP {status}: {reason}"))
                .with_details(body.clone())
        }
        RawFailure::Malformed { status, content_type } => {
            ApiError::new(ErrorKind::Server, FailureOrigin::MalformedResponse, endpoint)
                .with_message("Invalid response format from upstream API")
                .with_details(serde_json::json!({
                    "status": status,
                    "contentType": content_type,
                }))
        }
        RawFailure::Other { message } => {
            let message = if message.is_empty() {
                ErrorKind::Unknown.default_message().to_string()
            } else {
                message.clone()
            };
            ApiError::new(ErrorKind::Unknown, FailureOrigin::Gateway, endpoint).with_message(message)
        }
    }
}

/// Status table for step 4.
fn status_kind(status: u16) -> Option<ErrorKind> {
    match status {
        401 => Some(ErrorKind::InvalidCredentials),
        403 => Some(ErrorKind::InsufficientPermissions),
        429 => Some(ErrorKind::RateLimited),
        500 | 502 | 503 => Some(ErrorKind::Server),
        _ => None,
    }
}

/// Step 3: inspect the first entry of a structured `errors` list.
///
/// Returns the kind and the first error's raw message, or `None` when the
/// body carries no non-empty error list.
fn classify_error_list(body: &Value) -> Option<(ErrorKind, &str)> {
    let first = body.get("errors")?.as_array()?.first()?;
    let raw_message = first
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| first.as_str())
        .unwrap_or_default();
    let message = raw_message.to_lowercase();

    let kind = if message.contains("authentication") || message.contains("unauthorized") {
        ErrorKind::InvalidCredentials
    } else if message.contains("permission") || message.contains("access") {
        ErrorKind::InsufficientPermissions
    } else if message.contains("not found") && RESOURCE_KEYWORDS.iter().any(|k| message.contains(k)) {
        ErrorKind::InvalidResource
    } else if message.contains("rate limit") || message.contains("too many requests") {
        ErrorKind::RateLimited
    } else {
        ErrorKind::Validation
    };

    Some((kind, raw_message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graphql(message: &str) -> RawFailure {
        RawFailure::GraphQl {
            body: json!({ "errors": [{ "message": message }] }),
        }
    }

    fn status(status: u16, body: Value) -> RawFailure {
        RawFailure::Status {
            status,
            status_text: String::new(),
            body,
        }
    }

    #[test]
    fn test_transport_timeout_beats_network() {
        let timeout = RawFailure::Transport { message: "operation timed out".into(), timed_out: false };
        assert_eq!(classify(&timeout, "crm").kind, ErrorKind::Timeout);

        let flagged = RawFailure::Transport { message: "deadline".into(), timed_out: true };
        assert_eq!(classify(&flagged, "crm").kind, ErrorKind::Timeout);

        let refused = RawFailure::Transport { message: "connection refused".into(), timed_out: false };
        let err = classify(&refused, "crm");
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.origin, FailureOrigin::Transport);
        assert_eq!(err.source_endpoint, "crm");
    }

    #[test]
    fn test_graphql_hints() {
        let cases = [
            ("Authentication failed", ErrorKind::InvalidCredentials),
            ("User unauthorized for this action", ErrorKind::InvalidCredentials),
            ("No permission to write", ErrorKind::InsufficientPermissions),
            ("access denied", ErrorKind::InsufficientPermissions),
            ("board not found", ErrorKind::InvalidResource),
            ("Item 42 Not Found", ErrorKind::InvalidResource),
            ("complexity budget: rate limit reached", ErrorKind::RateLimited),
            ("Too many requests", ErrorKind::RateLimited),
            ("Parse error on \"}\"", ErrorKind::Validation),
        ];
        for (message, expected) in cases {
            assert_eq!(classify(&graphql(message), "crm").kind, expected, "message: {message}");
        }
    }

    #[test]
    fn test_not_found_without_resource_keyword_is_validation() {
        let err = classify(&graphql("field not found"), "crm");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "field not found");
    }

    #[test]
    fn test_graphql_keeps_details() {
        let body = json!({ "errors": [{ "message": "board not found" }], "account_id": 1 });
        let err = classify(&RawFailure::GraphQl { body: body.clone() }, "crm");
        assert_eq!(err.message, "board not found");
        assert_eq!(err.raw_details, body);
        assert_eq!(err.graphql_errors().map(Vec::len), Some(1));
    }

    #[test]
    fn test_401_always_invalid_credentials() {
        let bodies = [
            Value::Null,
            json!({ "errors": [{ "message": "permission denied" }] }),
            json!({ "errors": [{ "message": "board not found" }] }),
            json!("plain text"),
        ];
        for body in bodies {
            let err = classify(&status(401, body), "crm");
            assert_eq!(err.kind, ErrorKind::InvalidCredentials);
            assert_eq!(err.upstream_status(), Some(401));
        }
    }

    #[test]
    fn test_status_table() {
        assert_eq!(classify(&status(403, Value::Null), "crm").kind, ErrorKind::InsufficientPermissions);
        assert_eq!(classify(&status(429, Value::Null), "crm").kind, ErrorKind::RateLimited);
        for code in [500, 502, 503] {
            assert_eq!(classify(&status(code, Value::Null), "crm").kind, ErrorKind::Server);
        }
    }

    #[test]
    fn test_unlisted_status_consults_body_then_unknown() {
        let body = json!({ "errors": [{ "message": "Resource not found" }] });
        let err = classify(&status(404, body), "content");
        assert_eq!(err.kind, ErrorKind::InvalidResource);
        assert_eq!(err.message, ErrorKind::InvalidResource.default_message());

        let err = classify(
            &RawFailure::Status { status: 418, status_text: "I'm a teapot".into(), body: Value::Null },
            "crm",
        );
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.message, "HTTP 418: I'm a teapot");
    }

    #[test]
    fn test_malformed_and_fallback() {
        let malformed = RawFailure::Malformed { status: 200, content_type: Some("text/html".into()) };
        let err = classify(&malformed, "crm");
        assert_eq!(err.kind, ErrorKind::Server);
        assert_eq!(err.origin, FailureOrigin::MalformedResponse);

        let other = classify(&RawFailure::Other { message: String::new() }, "crm");
        assert_eq!(other.kind, ErrorKind::Unknown);
        assert_eq!(other.message, ErrorKind::Unknown.default_message());
    }
}
