//! Crawler module for page fetching and scrape orchestration
//!
//! This module contains the fetch/cache/pagination engine, including:
//! - HTTP fetching with timeout retries and charset decoding
//! - The cache/fetch gateway and its rate limiter
//! - The pagination walker shared by index and instance pages
//! - Index page parsing and instance discovery
//! - Overall scrape coordination

mod coordinator;
mod fetcher;
mod gateway;
mod index;
mod paginate;
mod parser;
mod rate_limit;

pub use coordinator::Scraper;
pub use fetcher::{build_http_client, default_charset, fetch_url, FetchResult, ACCEPT_HTML};
pub use gateway::{FetchStats, Gateway};
pub use index::{resolve_index, resolve_indexes};
pub use paginate::{
    NextPage, NoPagination, PageSource, PaginationWalker, QueryParamPagination, StopReason,
    WalkState, WalkedPage,
};
pub use parser::{parse_index, parse_selector};
pub use rate_limit::RateLimiter;
