use crate::config::types::{Config, HarvestConfig, OutputConfig, SelectorConfig, SourceConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvest_config(&config.harvest)?;
    validate_source_config(&config.source)?;
    validate_selector_config(&config.selector)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates walk and concurrency settings
fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.max_consecutive_failures < 1 {
        return Err(ConfigError::Validation(format!(
            "max_consecutive_failures must be >= 1, got {}",
            config.max_consecutive_failures
        )));
    }

    if config.max_concurrent_campaigns < 1 || config.max_concurrent_campaigns > 32 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_campaigns must be between 1 and 32, got {}",
            config.max_concurrent_campaigns
        )));
    }

    Ok(())
}

/// Validates the donor-list endpoint settings
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must be http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.sort.is_empty() {
        return Err(ConfigError::Validation("sort cannot be empty".to_string()));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the selector contract settings
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    if config.candidates_path.is_empty() {
        return Err(ConfigError::Validation(
            "candidates_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }

    if config.ledger_path.is_empty() {
        return Err(ConfigError::Validation(
            "ledger_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
