//! Index resolver
//!
//! Walks each configured index source (following its query-parameter
//! pagination when enabled) and collects the instance URLs it links to.

use crate::config::{IndexSource, MaxPages};
use crate::crawler::paginate::{
    NextPage, NoPagination, PageSource, PaginationWalker, QueryParamPagination,
};
use crate::crawler::parser::{parse_index, parse_selector};
use crate::UptonError;

/// Collects instance URLs from one index source
///
/// Links are returned in discovery order: page by page, then in document
/// order within each page. Duplicates are not removed.
///
/// # Arguments
///
/// * `source` - Where pages are fetched from
/// * `index` - The index page, selector and pagination options
/// * `default_cache` - Caching flag used unless the source overrides it
pub async fn resolve_index<S>(
    source: &mut S,
    index: &IndexSource,
    default_cache: bool,
) -> Result<Vec<String>, UptonError>
where
    S: PageSource + ?Sized,
{
    let selector = parse_selector(&index.selector)?;
    let options = &index.options;
    let use_cache = options.cache.unwrap_or(default_cache);

    let query_param;
    let (policy, max_pages): (&dyn NextPage, MaxPages) = if options.paginated {
        query_param = QueryParamPagination::new(
            &index.url,
            &options.pagination_param,
            options.start_index,
            options.interval,
        );
        (&query_param, options.max_pages)
    } else {
        (&NoPagination, MaxPages::Limited(1))
    };

    let walker = PaginationWalker::new(policy, max_pages, use_cache);
    let pages = walker.walk(source, &index.url).await?;

    let mut urls = Vec::new();
    for page in &pages {
        urls.extend(parse_index(&page.body, &selector, &index.url)?);
    }

    tracing::info!(
        "Found {} instance link(s) on {} page(s) of {}",
        urls.len(),
        pages.len(),
        index.url
    );
    Ok(urls)
}

/// Collects instance URLs from every index source, in configuration order
pub async fn resolve_indexes<S>(
    source: &mut S,
    indexes: &[IndexSource],
    default_cache: bool,
) -> Result<Vec<String>, UptonError>
where
    S: PageSource + ?Sized,
{
    let mut urls = Vec::new();
    for index in indexes {
        urls.extend(resolve_index(source, index, default_cache).await?);
    }
    Ok(urls)
}
