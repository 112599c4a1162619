//! Pagination walker
//!
//! Fetches a starting page, then keeps asking a [`NextPage`] policy for the
//! following URL until one of the stop conditions holds:
//!
//! - the fetched body is empty (an empty follow-up page is dropped; an
//!   empty starting page is kept)
//! - the page ceiling ([`MaxPages`]) is reached
//! - the policy returns an empty URL, or one that cannot be parsed
//! - the policy returns the URL that was just fetched
//!
//! The walk is an explicit loop over [`WalkState`], accumulating pages in
//! fetch order.

use crate::config::MaxPages;
use crate::url::{next_index_page_url, resolve_url};
use crate::{UptonError, UrlError};
use async_trait::async_trait;

/// Something that can fetch one page body
#[async_trait]
pub trait PageSource: Send {
    /// Fetches `url`, consulting the cache when `use_cache` is set
    async fn fetch_page(&mut self, url: &str, use_cache: bool) -> Result<String, UptonError>;
}

/// Computes the URL of the page after `current_url`
///
/// `page_index` is the zero-based index of the page being asked for, so the
/// first call of a walk receives 1. An empty string ends the walk.
pub trait NextPage: Send + Sync {
    fn next_url(&self, current_url: &str, page_index: u32) -> String;
}

impl<F> NextPage for F
where
    F: Fn(&str, u32) -> String + Send + Sync,
{
    fn next_url(&self, current_url: &str, page_index: u32) -> String {
        self(current_url, page_index)
    }
}

/// Policy for sources that are never paginated
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPagination;

impl NextPage for NoPagination {
    fn next_url(&self, _current_url: &str, _page_index: u32) -> String {
        String::new()
    }
}

/// Index pagination: `?<param>=N` on the original index URL
///
/// Page `k` of the walk carries `N = start_index + k * interval`; page 0 is
/// the index URL itself.
#[derive(Debug, Clone)]
pub struct QueryParamPagination {
    base_url: String,
    param: String,
    start_index: u32,
    interval: u32,
}

impl QueryParamPagination {
    pub fn new(base_url: &str, param: &str, start_index: u32, interval: u32) -> Self {
        Self {
            base_url: base_url.to_string(),
            param: param.to_string(),
            start_index,
            interval,
        }
    }
}

impl NextPage for QueryParamPagination {
    fn next_url(&self, _current_url: &str, page_index: u32) -> String {
        let page = self
            .start_index
            .saturating_add(page_index.saturating_mul(self.interval));

        match next_index_page_url(&self.base_url, &self.param, page) {
            Ok(url) => {
                tracing::debug!("Next index pagination URL is {}", url);
                url
            }
            Err(e) => {
                tracing::warn!("Cannot paginate {}: {}", self.base_url, e);
                String::new()
            }
        }
    }
}

/// One page produced by a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedPage {
    /// The URL that was fetched
    pub url: String,
    /// The fetched body
    pub body: String,
    /// Zero-based position in the walk
    pub page_index: u32,
}

/// Why a walk stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EmptyBody,
    MaxPages,
    NoNextUrl,
    NoProgress,
}

/// States of a single walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkState {
    /// About to fetch `url` as page `page_index`
    Fetching { page_index: u32, url: String },
    /// Page `page_index` was fetched from `url`; deciding whether to go on
    Evaluating {
        page_index: u32,
        url: String,
        empty: bool,
    },
    /// The walk is over
    Terminated(StopReason),
}

/// Walks a paginated sequence with one policy, ceiling and caching flag
pub struct PaginationWalker<'a> {
    policy: &'a dyn NextPage,
    max_pages: MaxPages,
    use_cache: bool,
}

impl<'a> PaginationWalker<'a> {
    pub fn new(policy: &'a dyn NextPage, max_pages: MaxPages, use_cache: bool) -> Self {
        Self {
            policy,
            max_pages,
            use_cache,
        }
    }

    /// Fetches `start_url` and every following page, in order
    ///
    /// The starting page is always fetched, so an unpaginated source yields
    /// exactly one page. Relative next URLs are resolved against `start_url`.
    pub async fn walk<S>(&self, source: &mut S, start_url: &str) -> Result<Vec<WalkedPage>, UptonError>
    where
        S: PageSource + ?Sized,
    {
        let mut pages: Vec<WalkedPage> = Vec::new();
        let mut state = WalkState::Fetching {
            page_index: 0,
            url: start_url.to_string(),
        };

        loop {
            state = match state {
                WalkState::Fetching { page_index, url } => {
                    let body = source.fetch_page(&url, self.use_cache).await?;
                    let empty = body.is_empty();
                    if empty && page_index > 0 {
                        // Only the starting page is kept when empty
                        WalkState::Terminated(StopReason::EmptyBody)
                    } else {
                        pages.push(WalkedPage {
                            url: url.clone(),
                            body,
                            page_index,
                        });
                        WalkState::Evaluating {
                            page_index,
                            url,
                            empty,
                        }
                    }
                }
                WalkState::Evaluating {
                    page_index,
                    url,
                    empty,
                } => self.evaluate(start_url, page_index, url, empty, pages.len())?,
                WalkState::Terminated(reason) => {
                    tracing::debug!(
                        "Pagination of {} stopped after {} page(s): {:?}",
                        start_url,
                        pages.len(),
                        reason
                    );
                    return Ok(pages);
                }
            };
        }
    }

    fn evaluate(
        &self,
        start_url: &str,
        page_index: u32,
        url: String,
        empty: bool,
        fetched: usize,
    ) -> Result<WalkState, UptonError> {
        if empty {
            return Ok(WalkState::Terminated(StopReason::EmptyBody));
        }

        if !self.max_pages.allows(fetched) {
            return Ok(WalkState::Terminated(StopReason::MaxPages));
        }

        let next = self.policy.next_url(&url, page_index + 1);
        if next.is_empty() {
            return Ok(WalkState::Terminated(StopReason::NoNextUrl));
        }

        let next = match resolve_url(&next, start_url) {
            Ok(next) => next,
            Err(UrlError::InvalidHref(e)) => {
                tracing::warn!("Unusable next page URL after {}: {}", url, e);
                return Ok(WalkState::Terminated(StopReason::NoNextUrl));
            }
            Err(e) => return Err(e.into()),
        };
        if next == url {
            return Ok(WalkState::Terminated(StopReason::NoProgress));
        }

        Ok(WalkState::Fetching {
            page_index: page_index + 1,
            url: next,
        })
    }
}
