//! Link resolution against an absolute base URL

use crate::{UrlError, UrlResult};
use url::{ParseError, Url};

/// Resolves a possibly-relative link against an absolute base URL
///
/// # Resolution Rules
///
/// - An absolute `href` is returned unchanged.
/// - A scheme-relative `href` (`//host/path`) takes the base's scheme.
/// - Root-relative, path-relative, query-only and fragment-only links are
///   joined per RFC 3986, so `dir` against `http://host/main/` becomes
///   `http://host/main/dir`.
///
/// # Arguments
///
/// * `href` - The link target, as found in the page
/// * `base` - The absolute URL of the page the link was found on
///
/// # Returns
///
/// * `Ok(String)` - The absolute URL
/// * `Err(UrlError::InvalidBase)` - `base` is not a valid absolute URL
/// * `Err(UrlError::InvalidHref)` - `href` cannot be parsed even as a reference
///
/// # Example
///
/// ```
/// use upton::url::resolve_url;
///
/// let resolved = resolve_url("dir", "http://www.example.org/main/").unwrap();
/// assert_eq!(resolved, "http://www.example.org/main/dir");
/// ```
pub fn resolve_url(href: &str, base: &str) -> UrlResult<String> {
    let base_url = parse_base(base)?;

    match Url::parse(href) {
        Ok(_) => Ok(href.to_string()),
        Err(ParseError::RelativeUrlWithoutBase) => join(&base_url, href),
        Err(e) => Err(UrlError::InvalidHref(format!("{}: {}", href, e))),
    }
}

/// Parses and checks the base URL
pub(crate) fn parse_base(base: &str) -> UrlResult<Url> {
    let url = Url::parse(base).map_err(|e| UrlError::InvalidBase(format!("{}: {}", base, e)))?;

    if url.cannot_be_a_base() {
        return Err(UrlError::InvalidBase(format!(
            "{}: cannot serve as a base for relative links",
            base
        )));
    }

    Ok(url)
}

fn join(base: &Url, href: &str) -> UrlResult<String> {
    base.join(href)
        .map(|url| url.to_string())
        .map_err(|e| UrlError::InvalidHref(format!("{}: {}", href, e)))
}
