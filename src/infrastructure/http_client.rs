//! HTTP transport for article fetching
//!
//! `Transport` performs exactly one request and reports what came back. It
//! never follows redirects or retries on its own: that policy belongs to the
//! `ResilientFetcher`, which drives a transport through its state machine.

use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{HeaderMap, HeaderValue, LOCATION, USER_AGENT},
};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::infrastructure::config::AppConfig;

/// Status line, redirect target and body of a single response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            location: None,
            body: String::new(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, timeout or body read failure; worth another attempt.
    #[error("Network error: {0}")]
    Network(String),

    /// The request could not even be built (malformed URL and the like).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one GET without following redirects.
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError>;
}

/// HTTP client configuration for crawling
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl HttpClientConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout_seconds: config.request_timeout_seconds,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

/// `reqwest` backed transport with automatic redirects turned off.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpClientConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| TransportError::InvalidRequest(format!("Invalid user agent: {e}")))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                TransportError::InvalidRequest(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client })
    }
}

fn classify(error: &reqwest::Error) -> TransportError {
    if error.is_builder() {
        TransportError::InvalidRequest(error.to_string())
    } else {
        TransportError::Network(error.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        debug!("🌐 HTTP GET: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| classify(&e))?;
        let status = response.status();

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        // Only a 200 body is ever used.
        let body = if status == StatusCode::OK {
            response.text().await.map_err(|e| classify(&e))?
        } else {
            String::new()
        };

        debug!("HTTP {} for {} ({} bytes)", status.as_u16(), url, body.len());
        Ok(RawResponse {
            status: status.as_u16(),
            location,
            body,
        })
    }
}
