//! Breach feed API client
//!
//! Issues a single bounded-timeout GET against the breach feed and parses the
//! body as a JSON array of records. No retries: one failed call is a failed
//! fetch for the current request cycle.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use thiserror::Error;

use super::BreachRecord;

/// Public breach listing of Have I Been Pwned
pub const HIBP_BREACHES_URL: &str = "https://haveibeenpwned.com/api/v3/breaches";

/// User agent sent with every upstream request (the feed rejects anonymous clients)
const USER_AGENT: &str = "Breach-Tracker-App";

/// Errors that can occur when fetching the breach feed
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream answered with a non-2xx status
    #[error("upstream returned HTTP {0}")]
    Status(StatusCode),

    /// Request did not complete within the configured timeout
    #[error("upstream request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Connection, TLS or body transfer failure
    #[error("upstream request failed: {0}")]
    Transport(reqwest::Error),

    /// Body was not a JSON array
    #[error("upstream response was not a JSON array: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Transport(err)
        }
    }
}

/// Anything that can produce the breach feed
///
/// The Breach Service depends on this trait rather than on [`UpstreamClient`]
/// so it can be exercised with scripted fakes.
#[async_trait]
pub trait BreachSource: Send + Sync {
    /// Fetches the feed in upstream order
    async fn fetch_breaches(&self) -> Result<Vec<BreachRecord>, FetchError>;

    /// Checks that the feed is reachable without keeping the payload
    async fn check_reachable(&self) -> Result<(), FetchError> {
        self.fetch_breaches().await.map(|_| ())
    }
}

/// HTTP client for the breach feed
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl UpstreamClient {
    /// Creates a client for the public feed
    pub fn new(timeout: Duration) -> Self {
        Self::with_url(HIBP_BREACHES_URL, timeout)
    }

    /// Creates a client for a custom feed URL
    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn get(&self) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response)
    }
}

#[async_trait]
impl BreachSource for UpstreamClient {
    async fn fetch_breaches(&self) -> Result<Vec<BreachRecord>, FetchError> {
        let response = self.get().await?;
        let text = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;
        let records: Vec<BreachRecord> = serde_json::from_str(&text)?;

        tracing::debug!(count = records.len(), url = %self.url, "fetched breach feed");
        Ok(records)
    }

    async fn check_reachable(&self) -> Result<(), FetchError> {
        self.get().await.map(|_| ())
    }
}
