//! Page fetching behind a trait so the orchestrator can be driven without a network.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status { url: Url, status: u16 },

    #[error("failed to read body of {url}: {source}")]
    Body {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the HTML of `url`. Non-2xx responses are errors.
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// `reqwest`-backed fetcher with a bounded per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Body {
            url: url.clone(),
            source,
        })
    }
}
