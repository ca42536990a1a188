//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The [`Fetcher`] capability trait the rest of the engine talks to
//! - Building a reqwest client with proper user agent and timeouts
//! - Retry logic for transient transport failures
//! - Error classification

use crate::config::HttpSettings;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A fetched HTTP response
///
/// Carries enough of the response for the crawl to decide what to do
/// with it. An error status is still a `FetchedPage`; only transport
/// problems surface as [`FetchError`].
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after any redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value, empty when absent
    pub content_type: String,
    /// Response body
    pub body: String,
}

impl FetchedPage {
    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the Content-Type marks the body as HTML
    pub fn is_html(&self) -> bool {
        self.content_type.contains("text/html")
    }
}

/// Transport-level fetch failures
///
/// HTTP error statuses are not errors here; they come back as a
/// [`FetchedPage`] and the caller decides what they mean.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request timed out for {url}")]
    Timeout { url: String },

    #[error("connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("request failed for {url}: {message}")]
    Request { url: String, message: String },
}

/// Capability trait for retrieving pages
///
/// The crawl engine only ever fetches through this trait, robots.txt
/// included, so tests can substitute an in-memory implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header value to send
/// * `settings` - Timeout settings for the client
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &str,
    settings: &HttpSettings,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs_f64(settings.timeout))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetcher`] used outside of tests
///
/// Redirects are followed by the client, so `final_url` on the returned
/// page is the post-redirect location.
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Timeout | Retry up to `max_retries` times |
/// | Connection failure | Retry up to `max_retries` times |
/// | Other transport error | Retry up to `max_retries` times |
/// | Any HTTP status | Returned as a page, never retried |
///
/// The wait between attempts is `retry_backoff * attempt` seconds.
pub struct HttpFetcher {
    client: Client,
    settings: HttpSettings,
}

impl HttpFetcher {
    /// Creates a fetcher with a freshly built client
    pub fn new(user_agent: &str, settings: HttpSettings) -> Result<Self, crate::LinkmapError> {
        let client = build_http_client(user_agent, &settings)?;
        Ok(Self { client, settings })
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, &e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, &e))?;

        Ok(FetchedPage {
            final_url,
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.settings.max_retries {
                        return Err(e);
                    }
                    let backoff =
                        Duration::from_secs_f64(self.settings.retry_backoff * attempt as f64);
                    tracing::warn!(
                        "fetch attempt {} for {} failed: {}, retrying in {:.1}s",
                        attempt,
                        url,
                        e,
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

/// Classifies a reqwest error into a [`FetchError`]
fn classify_error(url: &Url, e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
