use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use linkmap::config::load_config;
///
/// let config = load_config(Path::new("linkmap.toml")).unwrap();
/// println!("Workers: {}", config.crawl.concurrency);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

/// Applies `LINKMAP_*` environment variable overrides on top of a
/// configuration.
///
/// Recognized variables: `LINKMAP_CONCURRENCY`,
/// `LINKMAP_FETCH_CONCURRENCY`, `LINKMAP_REQUESTS_PER_SECOND`,
/// `LINKMAP_USER_AGENT`, `LINKMAP_MAX_PAGES`, `LINKMAP_TIMEOUT`,
/// `LINKMAP_MAX_RETRIES` and `LINKMAP_RETRY_BACKOFF`. An unset variable
/// leaves the existing value in place; a set but unparseable one is an
/// error rather than being silently ignored.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
    if let Some(v) = env_parse::<usize>("LINKMAP_CONCURRENCY")? {
        config.crawl.concurrency = v;
    }
    if let Some(v) = env_parse::<usize>("LINKMAP_FETCH_CONCURRENCY")? {
        config.crawl.fetch_concurrency = v;
    }
    if let Some(v) = env_parse::<f64>("LINKMAP_REQUESTS_PER_SECOND")? {
        config.crawl.requests_per_second = v;
    }
    if let Ok(v) = std::env::var("LINKMAP_USER_AGENT") {
        config.crawl.user_agent = v;
    }
    if let Some(v) = env_parse::<usize>("LINKMAP_MAX_PAGES")? {
        config.crawl.max_pages = Some(v);
    }
    if let Some(v) = env_parse::<f64>("LINKMAP_TIMEOUT")? {
        config.http.timeout = v;
    }
    if let Some(v) = env_parse::<u32>("LINKMAP_MAX_RETRIES")? {
        config.http.max_retries = v;
    }
    if let Some(v) = env_parse::<f64>("LINKMAP_RETRY_BACKOFF")? {
        config.http.retry_backoff = v;
    }
    Ok(())
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Validation(format!("{} is invalid: {}", name, e))),
        Err(_) => Ok(None),
    }
}
