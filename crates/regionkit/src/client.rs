//! HTTP retrieval of the source page
//!
//! Design: [`PageFetcher`] is the seam between the catalog and the network.
//! [`HttpFetcher`] is the reqwest-backed implementation; tests and callers
//! with their own transport can plug in another one.

use crate::error::FetchError;
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default whole-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on the response body
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Fetch options that can be configured via the catalog builder
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Custom User-Agent
    pub user_agent: Option<String>,
    /// Timeout for establishing the connection
    pub connect_timeout: Duration,
    /// Timeout for the whole request, body included
    pub request_timeout: Duration,
    /// Maximum accepted body size
    pub max_bytes: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// A successfully retrieved page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Raw body
    pub body: Bytes,
}

/// Retrieves a page by URL
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &'static str;

    /// GET the URL
    ///
    /// Returns the page for any HTTP status; classifying the status is up
    /// to the caller. Transport failures are returned as errors.
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedPage, FetchError>;
}

/// reqwest-backed [`PageFetcher`]
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl HttpFetcher {
    /// Create a new HTTP fetcher
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedPage, FetchError> {
        let parsed = validate_url(url)?;

        let mut headers = HeaderMap::new();
        let user_agent = options.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html, application/xhtml+xml, */*;q=0.8"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .build()
            .map_err(FetchError::ClientBuildError)?;

        let response = client
            .get(parsed)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        debug!(status_code, content_type = ?content_type, "Received response");

        if let Some(len) = response.content_length() {
            if len > options.max_bytes {
                return Err(FetchError::TooLarge {
                    max_bytes: options.max_bytes,
                });
            }
        }

        let body = read_body_limited(response, options.max_bytes).await?;

        Ok(FetchedPage {
            status_code,
            content_type,
            body,
        })
    }
}

/// Parse and check that the URL is http(s)
pub fn validate_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(FetchError::InvalidUrl),
    }
}

/// Stream the body, failing once it grows past `max_bytes`
async fn read_body_limited(
    response: reqwest::Response,
    max_bytes: u64,
) -> Result<Bytes, FetchError> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::from_reqwest)?;
        if body.len() as u64 + chunk.len() as u64 > max_bytes {
            return Err(FetchError::TooLarge { max_bytes });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(body))
}
