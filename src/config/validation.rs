use crate::config::types::{Config, NotifyConfig, SelectorConfig, StorageConfig, WatchConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_watch_config(&config.watch)?;
    validate_storage_config(&config.storage)?;
    validate_notify_config(&config.notify)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Validates the watched link and timing
fn validate_watch_config(config: &WatchConfig) -> Result<(), ConfigError> {
    if config.link.is_empty() {
        return Err(ConfigError::Validation(
            "link is required (set [watch] link or pass --link)".to_string(),
        ));
    }

    let url = Url::parse(&config.link)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid link '{}': {}", config.link, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Link '{}' must use http or https",
            config.link
        )));
    }

    if config.timeout == 0 {
        return Err(ConfigError::Validation(
            "timeout must be a positive number of seconds".to_string(),
        ));
    }

    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "request-timeout must be a positive number of seconds".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates notifier configuration
fn validate_notify_config(config: &NotifyConfig) -> Result<(), ConfigError> {
    if let Some(file) = &config.file {
        if file.is_empty() {
            return Err(ConfigError::Validation(
                "notify file path cannot be empty".to_string(),
            ));
        }
    }

    if let Some(telegram) = &config.telegram {
        if telegram.bot.is_empty() || telegram.cid.is_empty() {
            return Err(ConfigError::Validation(
                "telegram notifier needs both bot and cid".to_string(),
            ));
        }

        Url::parse(&telegram.api_base).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid telegram api-base: {}", e))
        })?;
    }

    Ok(())
}

/// Validates that both selectors are valid CSS
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    for selector in [&config.pagination, &config.items] {
        Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
            selector: selector.clone(),
            message: format!("{:?}", e),
        })?;
    }
    Ok(())
}
