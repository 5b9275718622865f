use crate::config::types::{CrawlerConfig, LocaleConfig};
use crate::ConfigError;
use url::Url;

/// Validates a locale document
pub fn validate_locale_config(config: &LocaleConfig) -> Result<(), ConfigError> {
    if config.categories.is_empty() {
        return Err(ConfigError::Validation(
            "locale document must list at least one category".to_string(),
        ));
    }

    for category in &config.categories {
        validate_category_url(category)?;
    }

    Ok(())
}

/// Validates crawler configuration
pub fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_timeouts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_timeouts must be >= 1, got {}",
            config.max_timeouts
        )));
    }

    if config.max_page == Some(0) {
        return Err(ConfigError::Validation(
            "max_page must be >= 1 when set".to_string(),
        ));
    }

    if config.request_timeout.is_zero() {
        return Err(ConfigError::Validation(
            "request_timeout must be greater than zero".to_string(),
        ));
    }

    if config.retry_backoff > config.max_retry_backoff {
        return Err(ConfigError::Validation(format!(
            "retry_backoff ({:?}) cannot exceed max_retry_backoff ({:?})",
            config.retry_backoff, config.max_retry_backoff
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a category base URL
fn validate_category_url(category: &str) -> Result<(), ConfigError> {
    let url = Url::parse(category)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid category URL '{}': {}", category, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "Category URL '{}' must use HTTP or HTTPS",
            category
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Category URL '{}' has no host",
            category
        )));
    }

    Ok(())
}
