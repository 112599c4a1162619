//! Scrape coordinator - main scrape orchestration logic
//!
//! This module drives a whole scrape run:
//! - Resolving the instance URL list (given up front, discovered from index
//!   pages, or both)
//! - Walking each instance's pagination
//! - Invoking the caller's transform on every fetched page
//! - Optionally writing the results as delimited text

use crate::config::{
    validate, validate_index_source, IndexOptions, IndexSource, MaxPages, ScraperConfig,
    ScraperSettings,
};
use crate::crawler::gateway::Gateway;
use crate::crawler::index::resolve_indexes;
use crate::crawler::paginate::{NextPage, NoPagination, PageSource, PaginationWalker};
use crate::output::{write_delimited, IntoRows};
use crate::page::Page;
use crate::UptonError;
use std::fs::File;
use std::io::BufWriter;
use std::ops::Add;
use std::path::Path;
use url::Url;

/// Main scraper structure
///
/// A scraper owns its page source (by default a [`Gateway`]), its settings,
/// and the instance URLs it has discovered. Nothing is shared between
/// scrapers.
pub struct Scraper<S: PageSource = Gateway> {
    source: S,
    settings: ScraperSettings,
    instance_urls: Vec<String>,
    indexes: Vec<IndexSource>,
    discovered: Option<Vec<String>>,
    instance_pagination: Box<dyn NextPage>,
    instance_max_pages: MaxPages,
}

impl Scraper<Gateway> {
    /// Creates a scraper from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Scraper)` - Configuration is valid and the cache folder is usable
    /// * `Err(UptonError)` - Invalid configuration or unusable cache folder
    pub fn new(config: ScraperConfig) -> Result<Self, UptonError> {
        validate(&config)?;
        let gateway = Gateway::new(&config)?;
        Ok(Self::with_source(gateway, config))
    }

    /// Creates a scraper with default settings for one index page
    ///
    /// # Arguments
    ///
    /// * `index_url` - Absolute URL of the page listing instances
    /// * `selector` - CSS selector matching the links to instances
    pub fn from_index(index_url: &str, selector: &str) -> Result<Self, UptonError> {
        Self::new(ScraperConfig::default())?.index(index_url, selector, IndexOptions::default())
    }

    /// Creates a scraper with default settings for a fixed list of instances
    pub fn from_instances<I, U>(urls: I) -> Result<Self, UptonError>
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        Self::new(ScraperConfig::default())?.instances(urls)
    }
}

impl<S: PageSource> Scraper<S> {
    /// Creates a scraper over an arbitrary page source
    ///
    /// The configuration is taken as-is; call [`validate`] first if it did not
    /// come from [`load_config`](crate::config::load_config).
    pub fn with_source(source: S, config: ScraperConfig) -> Self {
        Self {
            source,
            settings: config.scraper,
            instance_urls: config.instances,
            indexes: config.indexes,
            discovered: None,
            instance_pagination: Box::new(NoPagination),
            instance_max_pages: MaxPages::Unbounded,
        }
    }

    /// Adds an index page to discover instances from
    ///
    /// Fails with [`UptonError::InvalidArgument`] if the URL is not absolute
    /// or the selector does not parse.
    pub fn index(
        mut self,
        url: &str,
        selector: &str,
        options: IndexOptions,
    ) -> Result<Self, UptonError> {
        let index = IndexSource {
            url: url.to_string(),
            selector: selector.to_string(),
            options,
        };
        validate_index_source(&index).map_err(|e| UptonError::InvalidArgument(e.to_string()))?;
        self.indexes.push(index);
        self.discovered = None;
        Ok(self)
    }

    /// Appends instance URLs to scrape
    pub fn instances<I, U>(mut self, urls: I) -> Result<Self, UptonError>
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        for url in urls {
            let url = url.into();
            let parsed = Url::parse(&url)
                .map_err(|e| UptonError::InvalidArgument(format!("{} is not an absolute URL: {}", url, e)))?;
            if parsed.cannot_be_a_base() {
                return Err(UptonError::InvalidArgument(format!(
                    "{} is not an absolute URL",
                    url
                )));
            }
            self.instance_urls.push(url);
        }
        Ok(self)
    }

    /// Sets how paginated instance pages find their next page
    ///
    /// # Example
    ///
    /// ```no_run
    /// use upton::{MaxPages, Scraper};
    ///
    /// # fn example() -> upton::Result<()> {
    /// let scraper = Scraper::from_instances(["http://example.com/article?page=1"])?
    ///     .with_instance_pagination(
    ///         |url: &str, index: u32| {
    ///             let base = url.split('?').next().unwrap_or(url);
    ///             format!("{}?page={}", base, index + 1)
    ///         },
    ///         MaxPages::Limited(5),
    ///     );
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_instance_pagination<P>(mut self, policy: P, max_pages: MaxPages) -> Self
    where
        P: NextPage + 'static,
    {
        self.instance_pagination = Box::new(policy);
        self.instance_max_pages = max_pages;
        self
    }

    /// The page source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The page source, mutably
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn settings(&self) -> &ScraperSettings {
        &self.settings
    }

    /// Returns the instance URLs to scrape, discovering them on first use
    ///
    /// Pre-supplied URLs come first, followed by URLs discovered from the
    /// index pages. Discovery runs at most once per scraper.
    pub async fn instance_urls(&mut self) -> Result<Vec<String>, UptonError> {
        if self.discovered.is_none() {
            let discovered = if self.indexes.is_empty() {
                Vec::new()
            } else {
                tracing::info!("Resolving {} index source(s)", self.indexes.len());
                resolve_indexes(&mut self.source, &self.indexes, self.settings.cache_indexes)
                    .await?
            };
            self.discovered = Some(discovered);
        }

        let mut urls = self.instance_urls.clone();
        urls.extend(self.discovered.iter().flatten().cloned());
        Ok(urls)
    }

    /// Runs the scrape, calling `transform` on every fetched page
    ///
    /// Results are ordered by instance, then by page within the instance.
    /// Pages whose fetch failed are passed to `transform` with an empty body.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use upton::Scraper;
    ///
    /// # async fn example() -> upton::Result<()> {
    /// let mut scraper = Scraper::from_index("http://example.com/news", "h1 a")?;
    /// let headlines = scraper
    ///     .scrape(|page| page.select_text("h1.article-title").unwrap_or_default().join(" "))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scrape<R, F>(&mut self, mut transform: F) -> Result<Vec<R>, UptonError>
    where
        F: FnMut(&Page) -> R,
    {
        let urls = self.instance_urls().await?;
        tracing::info!("Scraping {} instance(s)", urls.len());

        let walker = PaginationWalker::new(
            self.instance_pagination.as_ref(),
            self.instance_max_pages,
            self.settings.cache_instances,
        );

        let mut results = Vec::new();
        for (instance_index, url) in urls.iter().enumerate() {
            let pages = walker.walk(&mut self.source, url).await?;
            for walked in pages {
                let page = Page::new(walked.body, url, &walked.url, instance_index, walked.page_index);
                results.push(transform(&page));
            }
        }

        tracing::info!("Scraped {} page(s)", results.len());
        Ok(results)
    }

    /// Scrapes and writes the results to a CSV file
    ///
    /// Returns the number of rows written.
    pub async fn scrape_to_csv<R, F>(&mut self, path: &Path, transform: F) -> Result<usize, UptonError>
    where
        R: IntoRows,
        F: FnMut(&Page) -> R,
    {
        self.scrape_to_file(path, ',', transform).await
    }

    /// Scrapes and writes the results to a TSV file
    pub async fn scrape_to_tsv<R, F>(&mut self, path: &Path, transform: F) -> Result<usize, UptonError>
    where
        R: IntoRows,
        F: FnMut(&Page) -> R,
    {
        self.scrape_to_file(path, '\t', transform).await
    }

    async fn scrape_to_file<R, F>(
        &mut self,
        path: &Path,
        sep: char,
        transform: F,
    ) -> Result<usize, UptonError>
    where
        R: IntoRows,
        F: FnMut(&Page) -> R,
    {
        let results = self.scrape(transform).await?;
        let mut writer = BufWriter::new(File::create(path)?);
        let rows = write_delimited(&mut writer, results, sep)?;
        tracing::info!("Wrote {} row(s) to {}", rows, path.display());
        Ok(rows)
    }
}

/// Combines two scrapers: index sources and instance URLs are concatenated,
/// the left scraper's source and settings are kept
impl<S: PageSource> Add for Scraper<S> {
    type Output = Scraper<S>;

    fn add(mut self, other: Scraper<S>) -> Self::Output {
        self.indexes.extend(other.indexes);
        self.instance_urls.extend(other.instance_urls);
        self.discovered = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::paginate::tests::StubSource;

    fn config() -> ScraperConfig {
        let mut config = ScraperConfig::default();
        config.scraper.request_delay_seconds = 0.0;
        config
    }

    fn article(title: &str) -> String {
        format!("<html><body><h1 class='title'>{}</h1></body></html>", title)
    }

    fn title(page: &Page) -> String {
        page.select_text("h1.title").unwrap().join("")
    }

    #[tokio::test]
    async fn test_scrape_from_index_in_order() {
        let source = StubSource::with_pages(&[
            (
                "http://example.com/",
                r#"<section><h1><a href="/1">1</a></h1><h1><a href="/2">2</a></h1>
                   <h1><a href="/3">3</a></h1><h1><a href="/4">4</a></h1></section>"#,
            ),
            ("http://example.com/1", article("one").as_str()),
            ("http://example.com/2", article("two").as_str()),
            ("http://example.com/3", article("three").as_str()),
            ("http://example.com/4", article("four").as_str()),
        ]);

        let mut scraper = Scraper::with_source(source, config())
            .index("http://example.com/", "section h1 a", IndexOptions::default())
            .unwrap();

        let titles = scraper.scrape(title).await.unwrap();
        assert_eq!(titles, vec!["one", "two", "three", "four"]);
    }

    #[tokio::test]
    async fn test_discovery_runs_once() {
        let source = StubSource::with_pages(&[
            ("http://example.com/", r#"<a href="/1">1</a>"#),
            ("http://example.com/1", article("one").as_str()),
        ]);
        let mut scraper = Scraper::with_source(source, config())
            .index("http://example.com/", "a", IndexOptions::default())
            .unwrap();

        scraper.scrape(title).await.unwrap();
        scraper.scrape(title).await.unwrap();

        let index_fetches = scraper
            .source()
            .requested
            .iter()
            .filter(|u| u.as_str() == "http://example.com/")
            .count();
        assert_eq!(index_fetches, 1);
    }

    #[tokio::test]
    async fn test_discovered_urls_follow_supplied_ones() {
        let source = StubSource::with_pages(&[("http://example.com/", r#"<a href="/found">f</a>"#)]);
        let mut scraper = Scraper::with_source(source, config())
            .instances(["http://example.com/given"])
            .unwrap()
            .index("http://example.com/", "a", IndexOptions::default())
            .unwrap();

        assert_eq!(
            scraper.instance_urls().await.unwrap(),
            vec!["http://example.com/given", "http://example.com/found"]
        );
    }

    #[tokio::test]
    async fn test_paginated_instances_are_flattened() {
        let source = StubSource::with_pages(&[
            ("http://example.com/a", article("a1").as_str()),
            ("http://example.com/a?page=2", article("a2").as_str()),
            ("http://example.com/b", article("b1").as_str()),
        ]);
        let next = |url: &str, index: u32| {
            let base = url.split('?').next().unwrap_or(url);
            format!("{}?page={}", base, index + 1)
        };

        let mut scraper = Scraper::with_source(source, config())
            .instances(["http://example.com/a", "http://example.com/b"])
            .unwrap()
            .with_instance_pagination(next, MaxPages::Unbounded);

        let pages = scraper
            .scrape(|page| {
                (
                    title(page),
                    page.instance_index(),
                    page.pagination_index(),
                    page.source_url().to_string(),
                )
            })
            .await
            .unwrap();

        assert_eq!(
            pages,
            vec![
                ("a1".to_string(), 0, 0, "http://example.com/a".to_string()),
                ("a2".to_string(), 0, 1, "http://example.com/a?page=2".to_string()),
                ("b1".to_string(), 1, 0, "http://example.com/b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_instance_still_reaches_transform() {
        let source = StubSource::with_pages(&[("http://example.com/ok", article("ok").as_str())]);
        let mut scraper = Scraper::with_source(source, config())
            .instances(["http://example.com/missing", "http://example.com/ok"])
            .unwrap();

        let empties = scraper.scrape(|page| page.is_empty()).await.unwrap();
        assert_eq!(empties, vec![true, false]);
    }

    #[tokio::test]
    async fn test_unparseable_next_url_does_not_abort_scrape() {
        let source = StubSource::with_pages(&[
            ("http://example.com/a", article("a").as_str()),
            ("http://example.com/b", article("b").as_str()),
        ]);
        let mut scraper = Scraper::with_source(source, config())
            .instances(["http://example.com/a", "http://example.com/b"])
            .unwrap()
            .with_instance_pagination(|_: &str, _: u32| "http://[bad".to_string(), MaxPages::Unbounded);

        let titles = scraper.scrape(title).await.unwrap();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn test_rejects_relative_instance() {
        let result = Scraper::with_source(StubSource::default(), config()).instances(["/relative"]);
        assert!(matches!(result, Err(UptonError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_relative_index() {
        let result = Scraper::with_source(StubSource::default(), config()).index(
            "relative/index.html",
            "a",
            IndexOptions::default(),
        );
        assert!(matches!(result, Err(UptonError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_add_concatenates_sources() {
        let left = Scraper::with_source(StubSource::default(), config())
            .instances(["http://example.com/1"])
            .unwrap();
        let right = Scraper::with_source(StubSource::default(), config())
            .instances(["http://example.com/2"])
            .unwrap();

        let mut combined = left + right;
        assert_eq!(
            combined.instance_urls().await.unwrap(),
            vec!["http://example.com/1", "http://example.com/2"]
        );
    }
}
