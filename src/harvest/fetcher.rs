//! Page retrieval
//!
//! `PageSource` is the seam between the pipeline and the network: given a URL
//! and a timeout it returns the raw page text or a `FetchError`. The
//! production implementation wraps a `reqwest` client; tests substitute
//! in-process fakes.

use crate::config::UserAgentConfig;
use crate::state::ItemOutcome;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failure while retrieving one page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Request failed for {url}: {message}")]
    Request { url: String, message: String },
}

impl FetchError {
    /// Maps the error to the outcome recorded for the locator
    pub fn outcome(&self) -> ItemOutcome {
        match self {
            Self::Timeout { .. } => ItemOutcome::Timeout,
            Self::Connect { .. } => ItemOutcome::Unreachable,
            Self::Status { .. } => ItemOutcome::HttpStatus,
            Self::Body { .. } | Self::Request { .. } => ItemOutcome::Failed,
        }
    }

    /// Classifies a reqwest error the way the outcome table expects
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            Self::Timeout { url }
        } else if error.is_connect() {
            Self::Connect {
                url,
                message: error.to_string(),
            }
        } else if let Some(status) = error.status() {
            Self::Status {
                url,
                status: status.as_u16(),
            }
        } else if error.is_body() || error.is_decode() {
            Self::Body {
                url,
                message: error.to_string(),
            }
        } else {
            Self::Request {
                url,
                message: error.to_string(),
            }
        }
    }
}

/// Retrieves raw page content
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches `url`, giving up after `timeout`
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// The User-Agent is `CrawlerName/Version (+ContactURL; ContactEmail)`.
/// Per-request timeouts are applied by `HttpPageSource`.
///
/// # Example
///
/// ```no_run
/// use detail_harvest::config::UserAgentConfig;
/// use detail_harvest::harvest::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "DetailHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `PageSource` backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from the user agent configuration
    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }
}
