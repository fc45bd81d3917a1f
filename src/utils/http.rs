// src/utils/http.rs

//! HTTP client utilities and the page-source seam.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::CrawlerConfig;

/// Outcome of fetching one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx response with its body
    Success(String),
    /// Connection, TLS, body-read or other transport failure
    Transport(String),
    /// The request did not finish in time
    Timeout,
    /// Non-2xx response
    Status(u16),
    /// The batch deadline passed before the request finished
    DeadlineExceeded,
}

impl FetchOutcome {
    /// Missing-tag recorded on a stub Record for this outcome.
    ///
    /// Returns `None` for a successful fetch.
    pub fn missing_tag(&self) -> Option<String> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Transport(_) => Some("http_error".to_string()),
            FetchOutcome::Timeout => Some("timeout".to_string()),
            FetchOutcome::Status(code) => Some(format!("http_{code}")),
            FetchOutcome::DeadlineExceeded => Some("deadline_exceeded".to_string()),
        }
    }

    /// Short description for logs and fatal errors.
    pub fn describe(&self) -> String {
        match self {
            FetchOutcome::Success(body) => format!("ok ({} bytes)", body.len()),
            FetchOutcome::Transport(reason) => format!("transport error: {reason}"),
            FetchOutcome::Timeout => "timed out".to_string(),
            FetchOutcome::Status(code) => format!("HTTP status {code}"),
            FetchOutcome::DeadlineExceeded => "run deadline exceeded".to_string(),
        }
    }
}

/// Anything that can return page markup for a URL.
///
/// Implementations must not panic or error; every failure is a `FetchOutcome`.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// `PageSource` backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a source with a client configured from crawler settings.
    pub fn from_config(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self::new(create_async_client(config)?))
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return FetchOutcome::Timeout,
            Err(e) => return FetchOutcome::Transport(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::Status(status.as_u16());
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Success(body),
            Err(e) if e.is_timeout() => FetchOutcome::Timeout,
            Err(e) => FetchOutcome::Transport(e.to_string()),
        }
    }
}
