use crate::config::types::{
    Config, ContentConfig, CrawlerConfig, LinkCheckConfig, ScoringConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_link_config(&config.links)?;
    validate_content_config(&config.content)?;
    validate_scoring_config(&config.scoring)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 || config.max_pages > 10_000 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and 10000, got {}",
            config.max_pages
        )));
    }

    if config.max_depth > 20 {
        return Err(ConfigError::Validation(format!(
            "max_depth must be <= 20, got {}",
            config.max_depth
        )));
    }

    if config.page_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "page_timeout_ms must be >= 100ms, got {}ms",
            config.page_timeout_ms
        )));
    }

    if config.deadline_secs == Some(0) {
        return Err(ConfigError::Validation(
            "deadline_secs must be greater than zero when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
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

/// Validates link checking configuration
fn validate_link_config(config: &LinkCheckConfig) -> Result<(), ConfigError> {
    for (name, size) in [
        ("internal_batch_size", config.internal_batch_size),
        ("external_batch_size", config.external_batch_size),
    ] {
        if size < 1 || size > 100 {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and 100, got {}",
                name, size
            )));
        }
    }

    if config.request_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 100ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    if config.max_redirect_hops < 1 || config.max_redirect_hops > 20 {
        return Err(ConfigError::Validation(format!(
            "max_redirect_hops must be between 1 and 20, got {}",
            config.max_redirect_hops
        )));
    }

    Ok(())
}

/// Validates content analysis configuration
fn validate_content_config(config: &ContentConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&config.similarity_threshold) {
        return Err(ConfigError::Validation(format!(
            "similarity_threshold must be within [0, 1], got {}",
            config.similarity_threshold
        )));
    }

    if config.target_keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "target_keywords cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates that penalty magnitudes keep their relative ordering
fn validate_scoring_config(config: &ScoringConfig) -> Result<(), ConfigError> {
    if config.blocking_penalty < config.critical_penalty
        || config.critical_penalty <= config.warning_penalty
        || config.warning_penalty <= config.minor_penalty
    {
        return Err(ConfigError::Validation(format!(
            "penalties must be ordered blocking >= critical > warning > minor, got {} / {} / {} / {}",
            config.blocking_penalty,
            config.critical_penalty,
            config.warning_penalty,
            config.minor_penalty
        )));
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

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| ConfigError::Validation(format!("Invalid email format: '{}'", email)))?;

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
