use crate::config::types::{IndexSource, MaxPages, ScraperConfig, ScraperSettings};
use crate::ConfigError;
use std::time::Duration;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &ScraperConfig) -> Result<(), ConfigError> {
    validate_settings(&config.scraper)?;

    if config.http.timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "timeout-seconds must be >= 1".to_string(),
        ));
    }

    for instance in &config.instances {
        validate_absolute_url(instance, "instance")?;
    }

    for index in &config.indexes {
        validate_index_source(index)?;
    }

    Ok(())
}

/// Validates the request delay
fn validate_settings(settings: &ScraperSettings) -> Result<(), ConfigError> {
    let delay = settings.request_delay_seconds;
    if !delay.is_finite() || delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "request-delay-seconds must be a non-negative number, got {}",
            delay
        )));
    }
    if Duration::try_from_secs_f64(delay).is_err() {
        return Err(ConfigError::Validation(format!(
            "request-delay-seconds is out of range, got {}",
            delay
        )));
    }
    Ok(())
}

/// Validates one index source and its pagination options
pub(crate) fn validate_index_source(index: &IndexSource) -> Result<(), ConfigError> {
    validate_absolute_url(&index.url, "index")?;

    if index.selector.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "Index '{}' must have a selector",
            index.url
        )));
    }

    if scraper::Selector::parse(&index.selector).is_err() {
        return Err(ConfigError::Validation(format!(
            "Index '{}' has an invalid selector '{}'",
            index.url, index.selector
        )));
    }

    let options = &index.options;
    if options.pagination_param.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Index '{}' must have a non-empty pagination-param",
            index.url
        )));
    }

    if options.interval == 0 {
        return Err(ConfigError::Validation(format!(
            "Index '{}' interval must be >= 1",
            index.url
        )));
    }

    if options.max_pages == MaxPages::Limited(0) {
        return Err(ConfigError::Validation(format!(
            "Index '{}' max-pages must be >= 1 or \"unbounded\"",
            index.url
        )));
    }

    Ok(())
}

/// Rejects URLs that do not parse or lack a scheme and host
fn validate_absolute_url(raw: &str, kind: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} URL '{}': {}", kind, raw, e)))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} URL '{}' must be absolute",
            kind, raw
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexOptions;

    fn index(url: &str, selector: &str, options: IndexOptions) -> IndexSource {
        IndexSource {
            url: url.to_string(),
            selector: selector.to_string(),
            options,
        }
    }

    #[test]
    fn test_validate_absolute_url() {
        assert!(validate_absolute_url("https://example.com/", "instance").is_ok());
        assert!(validate_absolute_url("http://example.com/a?b=c", "instance").is_ok());

        assert!(validate_absolute_url("/relative", "instance").is_err());
        assert!(validate_absolute_url("", "instance").is_err());
        assert!(validate_absolute_url("mailto:someone@example.com", "instance").is_err());
    }

    #[test]
    fn test_validate_index_source() {
        let ok = index("https://example.com/", "h1 a", IndexOptions::default());
        assert!(validate_index_source(&ok).is_ok());

        let no_selector = index("https://example.com/", "  ", IndexOptions::default());
        assert!(validate_index_source(&no_selector).is_err());

        let bad_selector = index("https://example.com/", "h1 >>> a[", IndexOptions::default());
        assert!(validate_index_source(&bad_selector).is_err());

        let zero_interval = index(
            "https://example.com/",
            "a",
            IndexOptions {
                interval: 0,
                ..IndexOptions::default()
            },
        );
        assert!(validate_index_source(&zero_interval).is_err());

        let zero_pages = index(
            "https://example.com/",
            "a",
            IndexOptions::paginated(MaxPages::Limited(0)),
        );
        assert!(validate_index_source(&zero_pages).is_err());
    }

    #[test]
    fn test_validate_delay() {
        let mut settings = ScraperSettings::default();
        assert!(validate_settings(&settings).is_ok());

        settings.request_delay_seconds = 0.0;
        assert!(validate_settings(&settings).is_ok());

        settings.request_delay_seconds = f64::NAN;
        assert!(validate_settings(&settings).is_err());

        settings.request_delay_seconds = -0.5;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_huge_delay_is_rejected_not_panicking() {
        let mut config = ScraperConfig::default();
        config.scraper.request_delay_seconds = 1e20;

        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
        assert_eq!(config.request_delay(), Duration::MAX);
    }
}
