//! Request identity and per-request bookkeeping.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID for every inbound request
//! - Read it back in handlers for logging
//! - Emit the single structured outcome line and metrics per request

use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
use std::net::IpAddr;
use std::time::Instant;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::observability::metrics;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string()).ok().map(RequestId::new)
    }
}

/// The request ID set by the request-id layer, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// What a handler knows about the request it is serving.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub route: &'static str,
    pub request_id: String,
    pub client_ip: IpAddr,
    pub start: Instant,
}

impl RequestContext {
    pub fn new(route: &'static str, headers: &HeaderMap, client_ip: IpAddr) -> Self {
        Self {
            route,
            request_id: request_id(headers),
            client_ip,
            start: Instant::now(),
        }
    }

    /// Log the outcome line and record metrics. `outcome` is `"success"` or
    /// an error code.
    pub fn finish(&self, status: StatusCode, outcome: &'static str) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        if status.is_server_error() {
            tracing::warn!(
                request_id = %self.request_id,
                route = self.route,
                client_ip = %self.client_ip,
                status = status.as_u16(),
                elapsed_ms,
                outcome,
                "Request completed"
            );
        } else {
            tracing::info!(
                request_id = %self.request_id,
                route = self.route,
                client_ip = %self.client_ip,
                status = status.as_u16(),
                elapsed_ms,
                outcome,
                "Request completed"
            );
        }
        metrics::record_request(self.route, outcome, status.as_u16(), self.start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_uuids() {
        let request = Request::new(());
        let mut make = MakeRequestUuidV4;
        let id = make.make_request_id(&request).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());
    }

    #[test]
    fn test_request_id_fallback() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "unknown");
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc"));
        assert_eq!(request_id(&headers), "abc");
    }
}
