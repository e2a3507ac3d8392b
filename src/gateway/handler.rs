//! `POST /monday`.
//!
//! ```text
//! Received → Validated → Forwarded → Relayed
//!                                  ↘ Classified
//! ```

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use std::net::SocketAddr;

use crate::error::ApiError;
use crate::gateway::{OutboundRequest, QueryRejection};
use crate::http::request::RequestContext;
use crate::http::response::ErrorResponse;
use crate::http::server::AppState;
use crate::observability::logging::redact_value;
use crate::security::ApiTarget;

pub const ROUTE: &str = "/monday";

pub async fn monday_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let ctx = RequestContext::new(ROUTE, &headers, addr.ip());

    match forward(&state, body).await {
        Ok(upstream_body) => {
            ctx.finish(StatusCode::OK, "success");
            Json(upstream_body).into_response()
        }
        Err(err) => {
            ctx.finish(err.status, err.code());
            err.into_response()
        }
    }
}

async fn forward(state: &AppState, body: Result<Bytes, BytesRejection>) -> Result<Value, ErrorResponse> {
    let body = body?;
    let parsed: Value = serde_json::from_slice(&body).map_err(|_| QueryRejection::InvalidQuery)?;
    let request = OutboundRequest::new(&parsed)?;

    execute_crm(state, &request).await.map_err(ErrorResponse::from)
}

/// Spend one unit of the CRM budget and run `request` under the retry policy.
pub async fn execute_crm(state: &AppState, request: &OutboundRequest) -> Result<Value, ApiError> {
    state.limiter.try_acquire(ApiTarget::Crm)?;

    state
        .retry
        .execute(|| state.crm.execute(request))
        .await
        .inspect_err(log_upstream_failure)
}

pub(crate) fn log_upstream_failure(err: &ApiError) {
    tracing::warn!(
        code = err.code(),
        endpoint = %err.source_endpoint,
        upstream_status = ?err.upstream_status(),
        details = %redact_value(&err.raw_details),
        "Upstream call failed"
    );
}
