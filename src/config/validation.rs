use crate::config::types::{Config, HarvestConfig, PathsConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on the concurrency ceiling
pub const MAX_CONCURRENCY: usize = 256;

/// Upper bound on per-locator retries
pub const MAX_RETRIES: u32 = 10;

/// Upper bound on the per-host delay (seconds)
pub const MAX_DELAY_SECS: f64 = 3600.0;

/// Upper bound on a single fetch timeout (seconds)
pub const MAX_FETCH_TIMEOUT_SECS: f64 = 86400.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvest_config(&config.harvest)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_paths_config(&config.paths)?;
    Ok(())
}

/// Validates fetch pipeline settings
pub fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if !(0.0..=MAX_DELAY_SECS).contains(&config.delay_secs) {
        return Err(ConfigError::Validation(format!(
            "delay_secs must be between 0 and {}, got {}",
            MAX_DELAY_SECS, config.delay_secs
        )));
    }

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if !(config.fetch_timeout_secs > 0.0 && config.fetch_timeout_secs <= MAX_FETCH_TIMEOUT_SECS) {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_secs must be > 0 and <= {}, got {}",
            MAX_FETCH_TIMEOUT_SECS, config.fetch_timeout_secs
        )));
    }

    if config.max_retries > MAX_RETRIES {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= {}, got {}",
            MAX_RETRIES, config.max_retries
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates input and checkpoint paths
fn validate_paths_config(config: &PathsConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("input", &config.input),
        ("partial", &config.partial),
        ("final", &config.final_output),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!("{} path cannot be empty", name)));
        }
    }

    if config.partial == config.final_output {
        return Err(ConfigError::Validation(format!(
            "partial and final targets must differ, both are '{}'",
            config.partial.display()
        )));
    }

    if let Some(prior) = &config.prior {
        if prior.as_os_str().is_empty() {
            return Err(ConfigError::Validation("prior path cannot be empty".to_string()));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
