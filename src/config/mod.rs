//! Configuration module for neagent-watch
//!
//! This module handles loading the optional TOML configuration file, layering
//! command-line overrides on top of it, and validating the result.
//!
//! # Example
//!
//! ```no_run
//! use neagent_watch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("neagent.toml")).unwrap();
//! println!("Watching {} every {}s", config.watch.link, config.watch.timeout);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, NotifyConfig, SelectorConfig, StorageConfig, TelegramConfig, WatchConfig,
    DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_TELEGRAM_API,
};

// Re-export parser functions
pub use parser::{
    apply_overrides, compute_config_hash, expand_path, load_config, parse_config, resolve_config,
    ConfigOverrides, DEFAULT_CONFIG_FILENAME,
};
pub use validation::validate;
