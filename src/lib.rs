//! Upton: a polite scraping toolkit
//!
//! This crate discovers "instance" pages from one or more "index" pages (or a
//! plain list of URLs), fetches each instance, optionally following its
//! pagination, and hands every fetched page to a caller-supplied transform.
//! Fetches go through an on-disk cache and a fixed delay between live requests.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod page;
pub mod url;

use thiserror::Error;

/// Main error type for Upton operations
#[derive(Debug, Error)]
pub enum UptonError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Base URL must be a valid absolute URL: {0}")]
    InvalidBase(String),

    #[error("Link must be a valid relative or absolute URL: {0}")]
    InvalidHref(String),
}

/// Cache storage errors
///
/// These are never recovered: a cache folder that cannot be created or
/// written makes the gateway unusable.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create cache folder {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to read cache entry {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write cache entry {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for Upton operations
pub type Result<T> = std::result::Result<T, UptonError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::config::{IndexOptions, MaxPages, ScraperConfig};
pub use crate::crawler::Scraper;
pub use crate::page::Page;
pub use crate::url::{resolve_url, slug};
