///! HTTP transport for the two feed endpoints

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::types::Source;

/// Fetches the raw payload for one source.
///
/// Implemented by `HttpFetcher` in production and by scripted fetchers in
/// orchestrator tests.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: Source) -> Result<Value>;
}

/// reqwest-backed fetcher with a shared client and per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
    posts_url: String,
    likes_url: String,
}

impl HttpFetcher {
    pub fn new(posts_url: &str, likes_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent("feedvault/0.1")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            posts_url: posts_url.to_string(),
            likes_url: likes_url.to_string(),
        })
    }

    fn url_for(&self, source: Source) -> &str {
        match source {
            Source::Posts => &self.posts_url,
            Source::Likes => &self.likes_url,
        }
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, source: Source) -> Result<Value> {
        let url = self.url_for(source);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context(format!("Failed to send request for {}", source))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "HTTP error {} for {}",
                response.status(),
                source
            ));
        }

        let payload: Value = response
            .json()
            .await
            .context(format!("Failed to parse JSON response for {}", source))?;

        Ok(payload)
    }
}
