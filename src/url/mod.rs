//! URL handling module for Upton
//!
//! This module provides link resolution against a base URL, query-parameter
//! pagination URLs for index pages, and the slug helper.

mod pagination;
mod resolve;

// Re-export main functions
pub use pagination::next_index_page_url;
pub use resolve::resolve_url;

/// Returns a short identifier for a page: its last path segment with any
/// query string and `.html` suffix removed
///
/// # Examples
///
/// ```
/// use upton::url::slug;
///
/// assert_eq!(slug("http://example.com/news/the-jungle.html?page=2"), "the-jungle");
/// ```
pub fn slug(url: &str) -> String {
    let last = url.rsplit('/').next().unwrap_or_default();
    let without_query = last.split('?').next().unwrap_or_default();

    match without_query.find(".html") {
        Some(pos) => without_query[..pos].to_string(),
        None => without_query.to_string(),
    }
}
