//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build shared application state (clients, limiters, retry policy)
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, CORS, request deadline,
//!   body limit, security headers, per-client rate limit)
//! - Serve until the shutdown signal, then drain

use axum::extract::DefaultBodyLimit;
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::http::request::MakeRequestUuidV4;
use crate::http::response::ErrorResponse;
use crate::resilience::timeouts::request_deadline_middleware;
use crate::resilience::RetryPolicy;
use crate::security::headers::{apply_security_headers, content_security_policy, cors_layer};
use crate::security::rate_limit::client_rate_limit_middleware;
use crate::security::{ClientRateLimiter, RateLimiter};
use crate::upstream::{ClientBuildError, ContentClient, CrmClient};
use crate::{contact, content, gateway, health};

/// How often idle client windows are dropped.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub crm: CrmClient,
    /// `None` when no content key is configured.
    pub content: Option<ContentClient>,
    pub limiter: Arc<RateLimiter>,
    pub client_limiter: Arc<ClientRateLimiter>,
    pub retry: RetryPolicy,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self, ClientBuildError> {
        let crm = CrmClient::new(&config.upstream, &config.timeouts)?;
        let content = match &config.content.api_key {
            Some(key) if !key.is_empty() => Some(ContentClient::new(
                &config.content,
                key.clone(),
                &config.upstream.user_agent,
                &config.timeouts,
            )?),
            _ => None,
        };

        Ok(Self {
            crm,
            content,
            limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
            client_limiter: Arc::new(ClientRateLimiter::new(&config.client_rate_limit)),
            retry: RetryPolicy::from(&config.retries),
            started_at: Instant::now(),
            config: Arc::new(config),
        })
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ClientBuildError> {
        let state = AppState::new(config)?;
        let router = Self::build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Every error produced here, including the body limit and the request
    /// deadline, is a JSON envelope that still passes through the header
    /// and CORS layers.
    fn build_router(state: AppState) -> Router {
        let config = state.config.clone();

        let mut router = Router::new()
            .route(gateway::handler::ROUTE, post(gateway::monday_handler))
            .route("/api/contact", post(contact::create_contact))
            .route("/api/board/columns", get(contact::board_columns))
            .route("/api/posts", get(content::list_posts))
            .route("/api/posts/{slug}", get(content::post_by_slug))
            .route("/health", get(health::health))
            .route("/api/status", get(health::api_status))
            .fallback(not_found)
            .with_state(state.clone())
            .layer(DefaultBodyLimit::max(config.security.max_body_size));

        if config.client_rate_limit.enabled {
            router = router.layer(middleware::from_fn_with_state(
                state.client_limiter.clone(),
                client_rate_limit_middleware,
            ));
        }

        router = router.layer(middleware::from_fn_with_state(
            Duration::from_secs(config.timeouts.request_secs),
            request_deadline_middleware,
        ));

        if config.security.enable_headers {
            let mut upstreams = vec![state.crm.url()];
            if let Some(content) = &state.content {
                upstreams.push(content.url());
            }
            let csp = content_security_policy(upstreams);
            router = apply_security_headers(router, config.environment, &csp);
        }

        let origins = config.security.origins_for(config.environment);

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors_layer(&origins)),
        )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = self.state.config.environment.as_str(),
            "HTTP server starting"
        );

        let (purge_stop, purge_rx) = broadcast::channel(1);
        tokio::spawn(purge_idle_clients(self.state.client_limiter.clone(), purge_rx));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await;

        let _ = purge_stop.send(());
        tracing::info!("HTTP server stopped");
        result
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.state.config
    }
}

async fn not_found(uri: Uri) -> Response {
    tracing::debug!(path = %uri.path(), "No route matched");
    ErrorResponse::not_found(uri.path()).into_response()
}

/// Periodically forget clients whose window has emptied.
async fn purge_idle_clients(limiter: Arc<ClientRateLimiter>, mut stop: broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(PURGE_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                limiter.purge_idle(Instant::now());
                tracing::trace!(clients = limiter.tracked_clients(), "Purged idle client windows");
            }
            _ = stop.recv() => break,
        }
    }
}
