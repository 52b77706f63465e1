//! neagent-watch: a listing page watcher
//!
//! This crate polls a classifieds listing page, walks its pagination, collects
//! item links, remembers which links were already seen in SQLite and sends the
//! new ones to the configured notifiers (console, file, Telegram).

pub mod config;
pub mod crawler;
pub mod notify;
pub mod storage;
pub mod watcher;

use thiserror::Error;

/// Main error type for neagent-watch operations
#[derive(Debug, Error)]
pub enum NeagentError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Notification error: {0}")]
    Notify(#[from] notify::NotifyError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Result type alias for neagent-watch operations
pub type Result<T> = std::result::Result<T, NeagentError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use storage::{LinkStore, SqliteLinkStore};
pub use watcher::{run_forever, Watcher};
