//! Blog post relay handlers.

use axum::extract::rejection::QueryRejection as ParamsRejection;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use std::net::SocketAddr;

use crate::config::ContentConfig;
use crate::error::{ApiError, ErrorKind};
use crate::gateway::handler::log_upstream_failure;
use crate::http::request::RequestContext;
use crate::http::response::ErrorResponse;
use crate::http::server::AppState;
use crate::security::validation::is_valid_slug;
use crate::security::ApiTarget;
use crate::upstream::content::ENDPOINT;
use crate::upstream::ContentClient;

/// `?limit=&page=` on the listing route.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PostsQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

impl PostsQuery {
    /// Limit clamped to `1..=max_limit`, page to at least 1.
    pub fn resolve(&self, config: &ContentConfig) -> (u32, u32) {
        let limit = self
            .limit
            .unwrap_or(config.default_limit)
            .clamp(1, config.max_limit.max(1));
        let page = self.page.unwrap_or(1).max(1);
        (limit, page)
    }
}

/// `GET /api/posts`
pub async fn list_posts(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    query: Result<Query<PostsQuery>, ParamsRejection>,
) -> Response {
    let ctx = RequestContext::new("/api/posts", &headers, addr.ip());

    let result = match query {
        Ok(Query(params)) => {
            let (limit, page) = params.resolve(&state.config.content);
            fetch(&state, |client| async move { client.list_posts(limit, page).await }).await
        }
        Err(_) => Err(ApiError::local(
            ErrorKind::Validation,
            "'limit' and 'page' must be positive integers",
            ENDPOINT,
        )
        .into()),
    };

    respond(&ctx, result)
}

/// `GET /api/posts/{slug}`
pub async fn post_by_slug(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Response {
    let ctx = RequestContext::new("/api/posts/{slug}", &headers, addr.ip());

    let result = if is_valid_slug(&slug) {
        let slug = slug.as_str();
        fetch(&state, |client| async move { client.post_by_slug(slug).await }).await
    } else {
        Err(ApiError::local(ErrorKind::Validation, "Invalid post slug", ENDPOINT).into())
    };

    respond(&ctx, result)
}

/// Run one content read under the content budget and the retry policy.
async fn fetch<'a, F, Fut>(state: &'a AppState, read: F) -> Result<Value, ErrorResponse>
where
    F: Fn(&'a ContentClient) -> Fut,
    Fut: std::future::Future<Output = Result<Value, ApiError>>,
{
    let Some(client) = state.content.as_ref() else {
        return Err(ErrorResponse::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Content feed is not configured",
        ));
    };

    state.limiter.try_acquire(ApiTarget::ContentFeed).map_err(ApiError::from)?;

    state
        .retry
        .execute(|| read(client))
        .await
        .inspect_err(log_upstream_failure)
        .map_err(ErrorResponse::from)
}

fn respond(ctx: &RequestContext, result: Result<Value, ErrorResponse>) -> Response {
    match result {
        Ok(body) => {
            ctx.finish(StatusCode::OK, "success");
            Json(body).into_response()
        }
        Err(err) => {
            ctx.finish(err.status, err.code());
            err.into_response()
        }
    }
}
