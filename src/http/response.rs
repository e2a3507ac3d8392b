//! JSON error envelope and status mapping.
//!
//! # Status Mapping
//! - GraphQL error list → 400 with `details`
//! - Transport timeout → 504, other transport failure → 502
//! - Non-JSON upstream body → 502
//! - Upstream non-2xx → same status, with `status` in the body
//! - Gateway-local: validation 400, rate limit 429, missing resource 404,
//!   request deadline 504
//! - Body over the configured limit → 413
//! - Anything else → 500

use axum::extract::rejection::BytesRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ErrorKind, FailureOrigin};
use crate::gateway::QueryRejection;
use crate::security::rate_limit::retry_after_secs;

/// Body of every error response: `{error, code, status?, details?, retryAfter?, path?}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// An error ready to send to the caller.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                code,
                status: None,
                details: None,
                retry_after: None,
                path: None,
            },
        }
    }

    /// 404 for routes that do not exist.
    pub fn not_found(path: impl Into<String>) -> Self {
        let mut response = Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Endpoint not found");
        response.body.path = Some(path.into());
        response
    }

    pub fn code(&self) -> &'static str {
        self.body.code
    }
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        let status = status_for(err);
        let mut response = Self::new(status, err.code(), err.message.clone());

        match err.origin {
            FailureOrigin::GraphQl => {
                response.body.details = err.graphql_errors().map(|errors| Value::Array(errors.clone()));
            }
            FailureOrigin::UpstreamStatus(upstream) => {
                response.body.status = Some(upstream);
            }
            _ => {}
        }
        response.body.retry_after = err.retry_after.as_ref().map(retry_after_secs);
        response
    }
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        Self::from(&err)
    }
}

impl From<QueryRejection> for ErrorResponse {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.code(), rejection.message())
    }
}

impl From<BytesRejection> for ErrorResponse {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", "Request body too large")
        } else {
            Self::new(StatusCode::BAD_REQUEST, ErrorKind::Validation.code(), "Could not read request body")
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let retry_after = self.body.retry_after;
        let mut response = (self.status, Json(self.body)).into_response();
        if let Some(secs) = retry_after {
            response.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ErrorResponse::from(&self).into_response()
    }
}

/// HTTP status sent to the caller for a classified error.
pub fn status_for(err: &ApiError) -> StatusCode {
    match err.origin {
        FailureOrigin::GraphQl => StatusCode::BAD_REQUEST,
        FailureOrigin::Transport if err.kind == ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FailureOrigin::Transport | FailureOrigin::MalformedResponse => StatusCode::BAD_GATEWAY,
        FailureOrigin::UpstreamStatus(status) => {
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        FailureOrigin::Gateway => match err.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::InvalidResource => StatusCode::NOT_FOUND,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}
