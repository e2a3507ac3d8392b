//! Liveness and upstream status handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::contact::handlers::columns_of;
use crate::error::{ApiError, FailureOrigin};
use crate::http::server::AppState;

/// Board checks slower than this report `degraded`.
const DEGRADED_AFTER: Duration = Duration::from_secs(5);

/// `GET /health` body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since startup.
    pub uptime: f64,
    pub environment: &'static str,
    pub version: &'static str,
}

/// `GET /api/status` body.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub monday: UpstreamStatus,
    pub proxy: ProxyStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamStatus {
    pub status: &'static str,
    /// Probe round trip in milliseconds.
    pub response_time: u64,
    pub last_checked: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    pub board: BoardStatus,
}

/// Whether the configured board can be read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardStatus {
    /// `healthy`, `degraded` or `unhealthy`.
    pub status: &'static str,
    pub board_access: bool,
    pub columns_loaded: bool,
    /// Probe plus board read, in milliseconds.
    pub response_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProxyStatus {
    pub status: &'static str,
    pub uptime: f64,
}

/// `GET /health`: process liveness. Never touches the upstream.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy",
        timestamp: now_rfc3339(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.config.environment.as_str(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /api/status`: probe the CRM with a minimal query, then check that
/// the configured board is readable.
///
/// Neither call is retried or charged to the CRM rate budget.
pub async fn api_status(State(state): State<AppState>) -> impl IntoResponse {
    let deadline = Duration::from_secs(state.config.timeouts.probe_secs);
    let started = Instant::now();
    let outcome = state.crm.probe(deadline).await;
    let response_time = started.elapsed().as_millis() as u64;

    let board = match &outcome {
        Ok(_) => {
            let board_id = &state.config.upstream.board_id;
            let checked = state
                .crm
                .board_check(board_id, deadline)
                .await
                .and_then(|body| columns_of(&body, board_id));
            if let Err(err) = &checked {
                tracing::warn!(code = err.code(), board_id = %board_id, "Board check failed");
            }
            board_status(checked.as_ref(), started.elapsed())
        }
        Err(err) => {
            tracing::warn!(code = err.code(), response_time_ms = response_time, "Upstream probe failed");
            board_status(Err(err), started.elapsed())
        }
    };

    let (status, report) = status_report(&outcome, response_time, board, state.started_at.elapsed());
    (status, Json(report))
}

/// Readable board → `healthy`, or `degraded` past [`DEGRADED_AFTER`].
fn board_status(checked: Result<&Value, &ApiError>, elapsed: Duration) -> BoardStatus {
    let response_time = elapsed.as_millis() as u64;
    match checked {
        Ok(columns) => BoardStatus {
            status: if elapsed > DEGRADED_AFTER { "degraded" } else { "healthy" },
            board_access: true,
            columns_loaded: columns.as_array().is_some_and(|c| !c.is_empty()),
            response_time,
            error: None,
        },
        Err(err) => BoardStatus {
            status: "unhealthy",
            board_access: false,
            columns_loaded: false,
            response_time,
            error: Some(err.message.clone()),
        },
    }
}

/// Healthy only for a clean response; 503 only when nothing came back.
fn status_report<T>(
    outcome: &Result<T, ApiError>,
    response_time: u64,
    board: BoardStatus,
    uptime: Duration,
) -> (StatusCode, StatusReport) {
    let (http_status, monday_status, error) = match outcome {
        Ok(_) => (StatusCode::OK, "healthy", None),
        Err(err) if err.origin == FailureOrigin::Transport => {
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(err.code()))
        }
        Err(err) => (StatusCode::OK, "unhealthy", Some(err.code())),
    };

    let report = StatusReport {
        monday: UpstreamStatus {
            status: monday_status,
            response_time,
            last_checked: now_rfc3339(),
            error,
            board,
        },
        proxy: ProxyStatus {
            status: "healthy",
            uptime: uptime.as_secs_f64(),
        },
    };
    (http_status, report)
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
