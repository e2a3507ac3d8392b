//! Upstream API clients.
//!
//! # Data Flow
//! ```text
//! Handler
//!     → crm.rs / content.rs (credential, headers, deadline)
//!     → reqwest call
//!     → read_json (status, content type, JSON parse)
//!     → classify on failure, body on success
//! ```
//!
//! # Design Decisions
//! - Credentials live only inside the clients; handlers never see them
//! - Every raw failure is classified here, at the boundary
//! - Clients are cheap to clone and shared through the application state

pub mod content;
pub mod crm;

pub use content::ContentClient;
pub use crm::CrmClient;

use axum::http::header::{InvalidHeaderValue, CONTENT_TYPE};
use serde_json::Value;

use crate::error::{classify, ApiError, RawFailure};

/// Failure to construct an upstream client.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Turn an upstream response into its JSON body, classifying non-2xx
/// statuses and non-JSON bodies.
pub(crate) async fn read_json(response: reqwest::Response, endpoint: &str) -> Result<Value, ApiError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| classify(&RawFailure::from_reqwest(&e), endpoint))?;

    if !status.is_success() {
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        return Err(classify(
            &RawFailure::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            },
            endpoint,
        ));
    }

    let is_json = content_type.as_deref().is_some_and(|ct| ct.contains("json"));
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(body) if is_json => Ok(body),
        _ => Err(classify(
            &RawFailure::Malformed {
                status: status.as_u16(),
                content_type,
            },
            endpoint,
        )),
    }
}
