//! Headless content API client (blog posts).
//!
//! Reads are keyed with a `key` query parameter and relayed without
//! reshaping.

use serde_json::Value;
use std::time::Duration;

use crate::config::{ContentConfig, Secret, TimeoutConfig};
use crate::error::{classify, ApiError, RawFailure};
use crate::resilience::timeouts::with_deadline;
use crate::upstream::{read_json, ClientBuildError};

pub const ENDPOINT: &str = "content";

#[derive(Debug, Clone)]
pub struct ContentClient {
    http: reqwest::Client,
    base_url: String,
    key: Secret,
    call_timeout: Duration,
}

impl ContentClient {
    pub fn new(
        content: &ContentConfig,
        key: Secret,
        user_agent: &str,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, ClientBuildError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()?;

        let mut base_url = content.url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            http,
            base_url,
            key,
            call_timeout: Duration::from_secs(timeouts.upstream_secs),
        })
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// One page of posts.
    pub async fn list_posts(&self, limit: u32, page: u32) -> Result<Value, ApiError> {
        let query = [("limit", limit.to_string()), ("page", page.to_string())];
        self.get(&self.base_url, &query).await
    }

    /// A single post. `slug` must already be validated.
    pub async fn post_by_slug(&self, slug: &str) -> Result<Value, ApiError> {
        let url = format!("{}slug/{}/", self.base_url, slug);
        self.get(&url, &[]).await
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        with_deadline(self.call_timeout, ENDPOINT, async {
            let response = self
                .http
                .get(url)
                .query(&[("key", self.key.expose())])
                .query(query)
                .send()
                .await
                .map_err(|e| classify(&RawFailure::from_reqwest(&e), ENDPOINT))?;
            read_json(response, ENDPOINT).await
        })
        .await
    }
}
