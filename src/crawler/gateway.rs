//! Cache/fetch gateway
//!
//! Decides, per request, whether a page comes from the cache or the network.
//! Live fetches are followed by the rate-limit delay and, when caching is
//! requested, written back to the cache.

use crate::cache::DiskCache;
use crate::config::ScraperConfig;
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult};
use crate::crawler::paginate::PageSource;
use crate::crawler::rate_limit::RateLimiter;
use crate::UptonError;
use async_trait::async_trait;
use reqwest::Client;

/// Counters describing what the gateway has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Requests that went to the network
    pub live_fetches: u64,
    /// Requests answered from the cache
    pub cache_hits: u64,
    /// Bodies written to the cache
    pub cache_writes: u64,
    /// Live fetches that failed and were reported as empty pages
    pub transient_failures: u64,
    /// Rate-limit pauses taken
    pub waits: u64,
}

/// Fetches pages from the cache or the network
pub struct Gateway {
    client: Client,
    cache: DiskCache,
    limiter: RateLimiter,
    timeout_retries: Option<u32>,
    stats: FetchStats,
}

impl Gateway {
    /// Builds a gateway from configuration
    ///
    /// The cache folder is created here, so an unusable folder fails before
    /// any request is made.
    pub fn new(config: &ScraperConfig) -> Result<Self, UptonError> {
        let client = build_http_client(&config.http)?;
        let cache = DiskCache::open(config.cache.folder(), config.cache.filenames)?;
        Ok(Self::with_parts(
            client,
            cache,
            RateLimiter::new(config.request_delay()),
            config.http.timeout_retries,
        ))
    }

    /// Builds a gateway from already-constructed parts
    pub fn with_parts(
        client: Client,
        cache: DiskCache,
        limiter: RateLimiter,
        timeout_retries: Option<u32>,
    ) -> Self {
        Self {
            client,
            cache,
            limiter,
            timeout_retries,
            stats: FetchStats::default(),
        }
    }

    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }

    pub fn stats(&self) -> FetchStats {
        FetchStats {
            waits: self.limiter.waits(),
            ..self.stats
        }
    }

    /// Returns the body of `url`
    ///
    /// # Behavior
    ///
    /// - An empty `url` yields an empty body without any I/O.
    /// - With `use_cache` and an existing entry, the cached body is returned
    ///   and no delay is taken.
    /// - Otherwise the page is fetched live. 4xx/5xx responses, malformed
    ///   URLs and exhausted timeout retries become an empty body.
    /// - After a live fetch, the body is cached (if `use_cache`) and the
    ///   rate-limit delay runs before returning.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The page body, possibly empty
    /// * `Err(UptonError::Http)` - Connection-level failure
    /// * `Err(UptonError::Cache)` - The cache could not be read or written
    pub async fn fetch(&mut self, url: &str, use_cache: bool) -> Result<String, UptonError> {
        if url.is_empty() {
            return Ok(String::new());
        }

        if use_cache {
            if let Some(body) = self.cache.get(url).await? {
                tracing::debug!("Using cached copy of {}", url);
                self.stats.cache_hits += 1;
                return Ok(body);
            }
            tracing::debug!("No cached copy of {}, downloading", url);
        }

        tracing::info!("Downloading {}", url);
        self.stats.live_fetches += 1;
        let result = fetch_url(&self.client, url, self.timeout_retries).await;

        let body = match result {
            FetchResult::Success {
                status_code,
                content_type,
                body,
            } => {
                tracing::debug!("Downloaded {} ({}, {})", url, status_code, content_type);
                body
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("HTTP {} for {}, treating as empty page", status_code, url);
                self.stats.transient_failures += 1;
                String::new()
            }
            FetchResult::InvalidUrl { error } => {
                tracing::warn!("Invalid URL {}: {}, treating as empty page", url, error);
                self.stats.transient_failures += 1;
                String::new()
            }
            FetchResult::Timeout { attempts } => {
                tracing::warn!(
                    "Giving up on {} after {} timed-out attempts, treating as empty page",
                    url,
                    attempts
                );
                self.stats.transient_failures += 1;
                String::new()
            }
            FetchResult::NetworkError { error } => {
                return Err(UptonError::Http {
                    url: url.to_string(),
                    source: error,
                });
            }
        };

        if use_cache {
            self.cache.put(url, &body).await?;
            self.stats.cache_writes += 1;
            tracing::debug!("Stashed {} at {}", url, self.cache.path_for(url).display());
        }

        self.limiter.wait_if_needed().await;
        Ok(body)
    }
}

#[async_trait]
impl PageSource for Gateway {
    async fn fetch_page(&mut self, url: &str, use_cache: bool) -> Result<String, UptonError> {
        self.fetch(url, use_cache).await
    }
}
