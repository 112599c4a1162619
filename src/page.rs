//! Fetched page handed to transform callbacks

use crate::crawler::parse_selector;
use crate::UptonError;
use scraper::Html;
use std::fmt;

/// One fetched unit: a single page of one instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    raw: String,
    url: String,
    source_url: String,
    instance_index: usize,
    pagination_index: u32,
}

impl Page {
    pub fn new(
        raw: String,
        url: &str,
        source_url: &str,
        instance_index: usize,
        pagination_index: u32,
    ) -> Self {
        Self {
            raw,
            url: url.to_string(),
            source_url: source_url.to_string(),
            instance_index,
            pagination_index,
        }
    }

    /// The raw page body
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The instance URL this page belongs to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL this page was actually fetched from
    ///
    /// Differs from [`url`](Self::url) for the second and later pages of a
    /// paginated instance.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Position of the instance in the scrape's instance list
    pub fn instance_index(&self) -> usize {
        self.instance_index
    }

    /// Position of this page within its instance
    pub fn pagination_index(&self) -> u32 {
        self.pagination_index
    }

    /// Returns true if the fetch produced no content
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Parses the body as an HTML document
    pub fn document(&self) -> Html {
        Html::parse_document(&self.raw)
    }

    /// Trimmed text of every element matching `selector`
    pub fn select_text(&self, selector: &str) -> Result<Vec<String>, UptonError> {
        let selector = parse_selector(selector)?;
        let document = self.document();
        Ok(document
            .select(&selector)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .collect())
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
