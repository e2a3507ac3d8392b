//! Lead-capture and board metadata handlers.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use std::net::SocketAddr;

use crate::contact::form::{created_item, ContactForm, ENDPOINT};
use crate::error::{ApiError, ErrorKind};
use crate::gateway::{execute_crm, OutboundRequest};
use crate::http::request::RequestContext;
use crate::http::response::ErrorResponse;
use crate::http::server::AppState;

const BOARD_COLUMNS: &str =
    "query GetBoardColumns($boardId: ID!) { boards(ids: [$boardId]) { columns { id title type settings_str } } }";

/// `POST /api/contact`: create a lead item on the configured board.
pub async fn create_contact(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let ctx = RequestContext::new("/api/contact", &headers, addr.ip());
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let response = ErrorResponse::from(rejection);
            ctx.finish(response.status, response.code());
            return response.into_response();
        }
    };

    let result = async {
        let form = ContactForm::parse(&body)?;
        form.validate()?;
        let request = form.to_request(&state.config.upstream.board_id, &state.config.contact);
        let response = execute_crm(&state, &request).await?;
        created_item(&response)
    }
    .await;

    match result {
        Ok(item) => {
            tracing::info!(request_id = %ctx.request_id, item_id = %item["id"], "Lead created");
            ctx.finish(StatusCode::CREATED, "success");
            (StatusCode::CREATED, Json(item)).into_response()
        }
        Err(err) => fail(&ctx, &err),
    }
}

/// `GET /api/board/columns`: the configured board's column layout.
pub async fn board_columns(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let ctx = RequestContext::new("/api/board/columns", &headers, addr.ip());
    let board_id = state.config.upstream.board_id.clone();

    let result = async {
        let mut variables = Map::new();
        variables.insert("boardId".into(), Value::String(board_id.clone()));
        let response = execute_crm(&state, &OutboundRequest::from_parts(BOARD_COLUMNS, variables)).await?;
        columns_of(&response, &board_id)
    }
    .await;

    match result {
        Ok(columns) => {
            ctx.finish(StatusCode::OK, "success");
            Json(json!({ "columns": columns })).into_response()
        }
        Err(err) => fail(&ctx, &err),
    }
}

pub(crate) fn columns_of(body: &Value, board_id: &str) -> Result<Value, ApiError> {
    let board = body
        .pointer("/data/boards")
        .and_then(Value::as_array)
        .and_then(|boards| boards.first())
        .ok_or_else(|| {
            ApiError::local(ErrorKind::InvalidResource, format!("Board not found: {board_id}"), ENDPOINT)
        })?;

    match board.get("columns") {
        Some(columns @ Value::Array(_)) => Ok(columns.clone()),
        _ => Err(ApiError::local(ErrorKind::Server, "Invalid columns data structure", ENDPOINT)),
    }
}

fn fail(ctx: &RequestContext, err: &ApiError) -> Response {
    let response = ErrorResponse::from(err);
    ctx.finish(response.status, response.code());
    response.into_response()
}
