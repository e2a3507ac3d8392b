//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crm_gateway::config::{GatewayConfig, Secret};
use crm_gateway::http::HttpServer;
use crm_gateway::lifecycle::Shutdown;

pub const API_KEY: &str = "abcdefghijklmnopqrstuvwxyz0123456789ABCD";
pub const CONTENT_KEY: &str = "367cdb8a8abe78fe688f751c76";
pub const BOARD_ID: &str = "1234567890";

/// What the mock upstream saw.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub api_version: Option<String>,
    pub body: Value,
}

/// What the mock upstream answers.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, content_type: &'static str, body: &str) -> Self {
        Self {
            status,
            content_type,
            body: body.to_string(),
        }
    }
}

type Responder = dyn Fn(u32, RecordedRequest) -> Pin<Box<dyn Future<Output = MockResponse> + Send>> + Send + Sync;

#[derive(Clone)]
struct MockState {
    calls: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    respond: Arc<Responder>,
}

/// A running programmable upstream.
pub struct MockUpstream {
    pub addr: SocketAddr,
    calls: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn crm_url(&self) -> String {
        format!("http://{}/v2", self.addr)
    }

    pub fn content_url(&self) -> String {
        format!("http://{}/ghost/api/v3/content/posts/", self.addr)
    }
}

/// Start a programmable mock upstream. `f` receives the 0-based call number
/// and the recorded request.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> MockUpstream
where
    F: Fn(u32, RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let respond: Arc<Responder> = Arc::new(
        move |n: u32, req: RecordedRequest| -> Pin<Box<dyn Future<Output = MockResponse> + Send>> {
            Box::pin(f(n, req))
        },
    );
    let state = MockState {
        calls: Arc::new(AtomicU32::new(0)),
        requests: Arc::new(Mutex::new(Vec::new())),
        respond,
    };

    let app = Router::new().fallback(mock_handler).with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream {
        addr,
        calls: state.calls,
        requests: state.requests,
    }
}

/// Mock upstream that always gives the same answer.
pub async fn start_fixed_upstream(response: MockResponse) -> MockUpstream {
    start_programmable_upstream(move |_, _| {
        let response = response.clone();
        async move { response }
    })
    .await
}

async fn mock_handler(State(state): State<MockState>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    let recorded = RecordedRequest {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_str("authorization"),
        api_version: header_str("api-version"),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };

    let n = state.calls.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().unwrap().push(recorded.clone());

    let response = (state.respond)(n, recorded).await;
    let status = StatusCode::from_u16(response.status).unwrap();
    (status, [(header::CONTENT_TYPE, response.content_type)], response.body).into_response()
}

/// Gateway configuration pointing at `upstream`, with fast retries.
pub fn test_config(upstream: &MockUpstream) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.url = upstream.crm_url();
    config.upstream.api_key = Secret::new(API_KEY);
    config.upstream.board_id = BOARD_ID.into();
    config.content.url = upstream.content_url();
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 50;
    config.retries.max_jitter_ms = 0;
    config.timeouts.upstream_secs = 5;
    config
}

/// A running gateway. Dropping the handle does not stop it; call `stop`.
pub struct TestGateway {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestGateway { addr, shutdown }
}

/// HTTP client for tests: no pooling, no system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
