//! HTTP fetcher implementation
//!
//! This module handles all live HTTP requests, including:
//! - Building the HTTP client from configuration
//! - GET requests with an HTML-preferring Accept header
//! - Decoding bodies with the declared charset
//! - Retrying timed-out requests
//! - Error classification

use crate::config::HttpConfig;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Accept header sent with every request
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Result of a live fetch
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value
        content_type: String,
        /// Decoded page body
        body: String,
    },

    /// Server answered with a 4xx or 5xx status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// The URL could not be parsed or requested
    InvalidUrl {
        /// Error description
        error: String,
    },

    /// Every attempt timed out and the retry budget is spent
    Timeout {
        /// Number of attempts made
        attempts: u32,
    },

    /// Connection-level failure (refused, DNS, TLS)
    NetworkError {
        /// The underlying client error
        error: reqwest::Error,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL, retrying on timeout
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Unparseable URL | Immediate → InvalidUrl |
/// | HTTP 4xx / 5xx | Immediate → HttpError |
/// | Timeout | Retry immediately, up to `timeout_retries` times (forever if `None`) |
/// | Connection refused, DNS, TLS | Immediate → NetworkError |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `timeout_retries` - Retry budget for timed-out attempts
pub async fn fetch_url(client: &Client, url: &str, timeout_retries: Option<u32>) -> FetchResult {
    if let Err(e) = Url::parse(url) {
        return FetchResult::InvalidUrl {
            error: e.to_string(),
        };
    }

    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match fetch_once(client, url).await {
            Err(e) if e.is_timeout() => {
                let retries_used = attempts - 1;
                if timeout_retries.is_some_and(|max| retries_used >= max) {
                    return FetchResult::Timeout { attempts };
                }
                tracing::warn!("Timeout fetching {} (attempt {}), retrying", url, attempts);
            }
            Err(e) if e.is_builder() => {
                return FetchResult::InvalidUrl {
                    error: e.to_string(),
                };
            }
            Err(e) => return FetchResult::NetworkError { error: e },
            Ok(result) => return result,
        }
    }
}

async fn fetch_once(client: &Client, url: &str) -> Result<FetchResult, reqwest::Error> {
    let response = client.get(url).header(ACCEPT, ACCEPT_HTML).send().await?;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        return Ok(FetchResult::HttpError {
            status_code: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = response
        .text_with_charset(default_charset(&content_type))
        .await?;

    Ok(FetchResult::Success {
        status_code: status.as_u16(),
        content_type,
        body,
    })
}

/// Charset used when the response does not declare one
///
/// HTML, XML and JSON default to UTF-8; other `text/*` types fall back to
/// the HTTP/1.1 default of ISO-8859-1, read as its windows-1252 superset.
pub fn default_charset(content_type: &str) -> &'static str {
    let media = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if media.contains("html") || media.contains("xml") || media.contains("json") {
        "utf-8"
    } else if media.starts_with("text/") {
        "windows-1252"
    } else {
        "utf-8"
    }
}
