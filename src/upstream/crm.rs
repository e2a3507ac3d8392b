//! CRM (work-management) GraphQL client.

use axum::http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::error::{classify, ApiError, RawFailure};
use crate::gateway::OutboundRequest;
use crate::resilience::timeouts::with_deadline;
use crate::upstream::{read_json, ClientBuildError};

/// Endpoint label used in classified errors and logs.
pub const ENDPOINT: &str = "crm";

const API_VERSION: HeaderName = HeaderName::from_static("api-version");
const PROBE_QUERY: &str = "query { me { id name } }";
const BOARD_CHECK_QUERY: &str = "query BoardCheck($boardId: ID!) { boards(ids: [$boardId]) { id name columns { id } } }";

/// Client for the CRM GraphQL endpoint. Holds the credential.
#[derive(Debug, Clone)]
pub struct CrmClient {
    http: reqwest::Client,
    url: String,
    call_timeout: Duration,
}

impl CrmClient {
    pub fn new(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, ClientBuildError> {
        let mut auth = HeaderValue::from_str(upstream.api_key.expose())?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(API_VERSION, HeaderValue::from_str(&upstream.api_version)?);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(upstream.user_agent.clone())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()?;

        Ok(Self {
            http,
            url: upstream.url.clone(),
            call_timeout: Duration::from_secs(timeouts.upstream_secs),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one GraphQL document and return the body of a clean response.
    pub async fn execute(&self, request: &OutboundRequest) -> Result<Value, ApiError> {
        self.execute_within(request, self.call_timeout).await
    }

    /// Send `query { me { id name } }` under `deadline`. Used by status checks.
    pub async fn probe(&self, deadline: Duration) -> Result<Value, ApiError> {
        let request = OutboundRequest::from_parts(PROBE_QUERY, Default::default());
        self.execute_within(&request, deadline).await
    }

    /// Read the board's id, name and column ids under `deadline`.
    pub async fn board_check(&self, board_id: &str, deadline: Duration) -> Result<Value, ApiError> {
        let mut variables = serde_json::Map::new();
        variables.insert("boardId".into(), Value::String(board_id.to_string()));
        let request = OutboundRequest::from_parts(BOARD_CHECK_QUERY, variables);
        self.execute_within(&request, deadline).await
    }

    async fn execute_within(&self, request: &OutboundRequest, deadline: Duration) -> Result<Value, ApiError> {
        with_deadline(deadline, ENDPOINT, async {
            let response = self
                .http
                .post(&self.url)
                .json(request)
                .send()
                .await
                .map_err(|e| classify(&RawFailure::from_reqwest(&e), ENDPOINT))?;

            let body = read_json(response, ENDPOINT).await?;
            if has_errors(&body) {
                return Err(classify(&RawFailure::GraphQl { body }, ENDPOINT));
            }
            Ok(body)
        })
        .await
    }
}

/// A 2xx body carrying a non-empty `errors` list.
fn has_errors(body: &Value) -> bool {
    body.get("errors")
        .and_then(Value::as_array)
        .is_some_and(|errors| !errors.is_empty())
}
