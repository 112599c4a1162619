//! Query-parameter pagination for index pages

use crate::url::resolve::parse_base;
use crate::UrlResult;

/// Builds the URL of an index page by setting a query parameter
///
/// The parameter replaces an existing value in place; other query pairs keep
/// their order.
///
/// # Example
///
/// ```
/// use upton::url::next_index_page_url;
///
/// let next = next_index_page_url("http://example.com/search?q=test", "page", 2).unwrap();
/// assert_eq!(next, "http://example.com/search?q=test&page=2");
/// ```
pub fn next_index_page_url(url: &str, param: &str, page: u32) -> UrlResult<String> {
    let mut parsed = parse_base(url)?;
    let page = page.to_string();

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    match pairs.iter_mut().find(|(k, _)| k == param) {
        Some((_, value)) => *value = page,
        None => pairs.push((param.to_string(), page)),
    }

    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    Ok(parsed.to_string())
}
