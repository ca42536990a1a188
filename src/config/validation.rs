use crate::config::types::{Config, CrawlOptions, HttpSettings};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_options(&config.crawl)?;
    validate_http_settings(&config.http)?;
    Ok(())
}

/// Validates crawl options
pub fn validate_crawl_options(options: &CrawlOptions) -> Result<(), ConfigError> {
    if options.concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            options.concurrency
        )));
    }

    if options.fetch_concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch-concurrency must be >= 1, got {}",
            options.fetch_concurrency
        )));
    }

    if !options.requests_per_second.is_finite() || options.requests_per_second <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "requests-per-second must be a positive number, got {}",
            options.requests_per_second
        )));
    }

    if options.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client settings
pub fn validate_http_settings(settings: &HttpSettings) -> Result<(), ConfigError> {
    if !settings.timeout.is_finite() || settings.timeout <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "timeout must be a positive number of seconds, got {}",
            settings.timeout
        )));
    }

    if !settings.retry_backoff.is_finite() || settings.retry_backoff < 0.0 {
        return Err(ConfigError::Validation(format!(
            "retry-backoff must be >= 0, got {}",
            settings.retry_backoff
        )));
    }

    Ok(())
}
