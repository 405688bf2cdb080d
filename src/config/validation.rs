use crate::config::types::{CacheConfig, Config, CrawlerConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on the worker pool size
const MAX_WORKERS: u32 = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    if let Some(cache) = &config.cache {
        validate_cache_config(cache)?;
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.worker_count < 1 || config.worker_count > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "worker_count must be between 1 and {}, got {}",
            MAX_WORKERS, config.worker_count
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    validate_seed_url(&config.seed_url)?;
    validate_domain_suffix(&config.domain_suffix)?;

    Ok(())
}

/// Validates the seed URL: absolute, HTTP(S), with a host
fn validate_seed_url(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use HTTP or HTTPS",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(())
}

/// Validates the domain suffix used by the host filter
///
/// A leading dot is allowed (".edu.cn"), since under `contains` matching it
/// narrows the match to label boundaries.
fn validate_domain_suffix(suffix: &str) -> Result<(), ConfigError> {
    if suffix.is_empty() {
        return Err(ConfigError::InvalidSuffix(
            "Domain suffix cannot be empty".to_string(),
        ));
    }

    if !suffix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidSuffix(format!(
            "Domain suffix '{}' contains invalid characters",
            suffix
        )));
    }

    if suffix.ends_with('.') || suffix.ends_with('-') || suffix.starts_with('-') {
        return Err(ConfigError::InvalidSuffix(format!(
            "Domain suffix '{}' cannot end with '.' or '-' or start with '-'",
            suffix
        )));
    }

    if suffix.contains("..") {
        return Err(ConfigError::InvalidSuffix(format!(
            "Domain suffix '{}' cannot contain consecutive dots",
            suffix
        )));
    }

    Ok(())
}

/// Validates the identifying header value
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent value cannot be empty".to_string(),
        ));
    }

    // Must be representable as an HTTP header value
    if !config.value.chars().all(|c| c == ' ' || c.is_ascii_graphic()) {
        return Err(ConfigError::Validation(format!(
            "user-agent value must be printable ASCII, got '{}'",
            config.value.escape_debug()
        )));
    }

    Ok(())
}

/// Validates response cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "cache directory cannot be empty".to_string(),
        ));
    }

    if config.max_bytes < 1 {
        return Err(ConfigError::Validation(
            "cache max-bytes must be >= 1".to_string(),
        ));
    }

    Ok(())
}
