//! Index page parsing
//!
//! Applies a CSS selector to an index page and turns the `href` of every
//! matched element into an absolute instance URL.

use crate::url::resolve_url;
use crate::{UptonError, UrlError};
use scraper::{Html, Selector};

/// Parses a CSS selector, reporting failures as invalid arguments
pub fn parse_selector(selector: &str) -> Result<Selector, UptonError> {
    Selector::parse(selector)
        .map_err(|e| UptonError::InvalidArgument(format!("invalid selector '{}': {}", selector, e)))
}

/// Extracts instance links from one index page
///
/// # Link Extraction Rules
///
/// - Every element matched by `selector` is considered, in document order.
/// - Elements without an `href` attribute are skipped.
/// - Each `href` is resolved against `base_url`; links that cannot be
///   parsed at all are skipped with a warning.
/// - Duplicates are kept.
///
/// # Arguments
///
/// * `html` - The index page body
/// * `selector` - Selector matching the anchors to follow
/// * `base_url` - Absolute URL of the index page
///
/// # Example
///
/// ```
/// use upton::crawler::{parse_index, parse_selector};
///
/// let html = r#"<h1 class="item"><a href="/thing/1">Thing 1</a></h1>"#;
/// let selector = parse_selector("h1.item a").unwrap();
/// let links = parse_index(html, &selector, "http://example.com/").unwrap();
/// assert_eq!(links, vec!["http://example.com/thing/1"]);
/// ```
pub fn parse_index(html: &str, selector: &Selector, base_url: &str) -> Result<Vec<String>, UptonError> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for element in document.select(selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let resolved = match resolve_url(href, base_url) {
            Ok(resolved) => resolved,
            Err(UrlError::InvalidHref(e)) => {
                tracing::warn!("Skipping unusable link {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if resolved != href {
            tracing::debug!("Resolved {} to {}", href, resolved);
        }
        links.push(resolved);
    }

    Ok(links)
}
