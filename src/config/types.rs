use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for a scrape run
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScraperConfig {
    #[serde(default)]
    pub scraper: ScraperSettings,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub http: HttpConfig,

    /// Instance URLs supplied up front
    #[serde(default)]
    pub instances: Vec<String>,

    /// Index pages used to discover further instance URLs
    #[serde(default, rename = "index")]
    pub indexes: Vec<IndexSource>,
}

impl ScraperConfig {
    /// Delay enforced after every live fetch
    ///
    /// Out-of-range values saturate; [`validate`](crate::config::validate)
    /// rejects them before a scraper is built.
    pub fn request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.scraper.request_delay_seconds.max(0.0))
            .unwrap_or(Duration::MAX)
    }
}

/// Scraper behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperSettings {
    /// Seconds to wait after each request that went to the network
    #[serde(rename = "request-delay-seconds", default = "default_delay")]
    pub request_delay_seconds: f64,

    /// Log every cache hit, download and sleep at info level
    #[serde(default)]
    pub verbose: bool,

    /// Whether instance pages are served from and written to the cache
    #[serde(rename = "cache-instances", default = "default_true")]
    pub cache_instances: bool,

    /// Whether index pages are served from and written to the cache
    #[serde(rename = "cache-indexes", default)]
    pub cache_indexes: bool,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            request_delay_seconds: default_delay(),
            verbose: false,
            cache_instances: true,
            cache_indexes: false,
        }
    }
}

/// Cache storage configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// Folder holding one file per cached URL; defaults to `<tmpdir>/upton`
    pub folder: Option<PathBuf>,

    /// How cache filenames are derived from URLs
    #[serde(default)]
    pub filenames: FilenameMode,
}

impl CacheConfig {
    /// Resolved cache folder
    pub fn folder(&self) -> PathBuf {
        self.folder
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("upton"))
    }
}

/// Cache key derivation mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilenameMode {
    /// Hex digest of the URL
    #[default]
    Hashed,
    /// URL stripped to `[A-Za-z0-9_-]` and truncated
    Readable,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout
    #[serde(rename = "timeout-seconds", default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Retries after a timed-out request; unset retries forever
    #[serde(rename = "timeout-retries", default)]
    pub timeout_retries: Option<u32>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
            timeout_retries: None,
        }
    }
}

/// An index page and how to read it
#[derive(Debug, Clone, Deserialize)]
pub struct IndexSource {
    /// Absolute URL of the first index page
    pub url: String,

    /// CSS selector matching the anchors that link to instances
    pub selector: String,

    #[serde(flatten)]
    pub options: IndexOptions,
}

/// Pagination options, per index source
#[derive(Debug, Clone, Deserialize)]
pub struct IndexOptions {
    /// Follow `?<param>=N` pages after the first
    #[serde(default)]
    pub paginated: bool,

    /// Query string parameter carrying the page number
    #[serde(rename = "pagination-param", default = "default_pagination_param")]
    pub pagination_param: String,

    /// Ceiling on the number of index pages fetched
    #[serde(rename = "max-pages", default)]
    pub max_pages: MaxPages,

    /// Base page number for the pages after the first
    ///
    /// The first page is always the configured `url` as-is, without the
    /// parameter. Page `k` (counting from 0) gets
    /// `start-index + k * interval`, so with the defaults the second page is
    /// `?page=2`.
    #[serde(rename = "start-index", default = "default_one")]
    pub start_index: u32,

    /// Amount added to the page number for each further page
    #[serde(default = "default_one")]
    pub interval: u32,

    /// Overrides `cache-indexes` for this source
    #[serde(default)]
    pub cache: Option<bool>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            paginated: false,
            pagination_param: default_pagination_param(),
            max_pages: MaxPages::default(),
            start_index: 1,
            interval: 1,
            cache: None,
        }
    }
}

impl IndexOptions {
    /// Options for a paginated index with the default parameter name
    pub fn paginated(max_pages: MaxPages) -> Self {
        Self {
            paginated: true,
            max_pages,
            ..Self::default()
        }
    }
}

/// Upper bound on the number of pages in one pagination walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxPages {
    Limited(u32),
    Unbounded,
}

impl MaxPages {
    /// Returns true if another page may be fetched after `fetched` pages
    pub fn allows(&self, fetched: usize) -> bool {
        match self {
            Self::Limited(max) => fetched < *max as usize,
            Self::Unbounded => true,
        }
    }
}

impl Default for MaxPages {
    fn default() -> Self {
        Self::Limited(2)
    }
}

impl<'de> Deserialize<'de> for MaxPages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u32),
            Keyword(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(Self::Limited(n)),
            Raw::Keyword(word) if word.eq_ignore_ascii_case("unbounded") => Ok(Self::Unbounded),
            Raw::Keyword(word) => Err(D::Error::custom(format!(
                "max-pages must be a number or \"unbounded\", got \"{}\"",
                word
            ))),
        }
    }
}

fn default_delay() -> f64 {
    30.0
}

fn default_true() -> bool {
    true
}

fn default_one() -> u32 {
    1
}

fn default_timeout() -> u64 {
    30
}

fn default_pagination_param() -> String {
    "page".to_string()
}

fn default_user_agent() -> String {
    format!("upton/{}", env!("CARGO_PKG_VERSION"))
}
