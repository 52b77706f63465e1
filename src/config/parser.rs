use crate::config::types::{Config, TelegramConfig, DEFAULT_TELEGRAM_API};
use crate::config::validation::validate;
use crate::ConfigError;
use directories::BaseDirs;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILENAME: &str = "neagent.toml";

/// Values given on the command line; each `Some` wins over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub link: Option<String>,
    pub timeout: Option<u64>,
    pub file: Option<String>,
    pub database_path: Option<String>,
    pub unattended: bool,
    pub no_stdout: bool,
    pub bot: Option<String>,
    pub cid: Option<String>,
}

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
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Parses TOML content without validating it
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so an operator can tell which revision of the file a
/// long-running watcher picked up.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Builds the effective configuration from an optional file and CLI overrides
///
/// When `path` is `None`, `./neagent.toml` is used if it exists, otherwise
/// the built-in defaults. Overrides are applied before validation, so a
/// required value such as the link may come from either layer.
///
/// # Returns
///
/// The validated configuration and the hash of the file it was read from (if any)
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<(Config, Option<String>), ConfigError> {
    let file = match path {
        Some(p) => Some(p.to_path_buf()),
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILENAME);
            local.is_file().then_some(local)
        }
    };

    let (mut config, hash) = match file {
        Some(file) => {
            tracing::debug!("Reading configuration from {}", file.display());
            let content = std::fs::read_to_string(&file)?;
            (parse_config(&content)?, Some(compute_config_hash(&file)?))
        }
        None => (Config::default(), None),
    };

    apply_overrides(&mut config, overrides);
    validate(&config)?;

    Ok((config, hash))
}

/// Applies command-line overrides on top of a configuration
pub fn apply_overrides(config: &mut Config, overrides: &ConfigOverrides) {
    if let Some(link) = &overrides.link {
        config.watch.link = link.clone();
    }
    if let Some(timeout) = overrides.timeout {
        config.watch.timeout = timeout;
    }
    if let Some(file) = &overrides.file {
        config.notify.file = Some(file.clone());
    }
    if let Some(db) = &overrides.database_path {
        config.storage.database_path = db.clone();
    }
    if overrides.unattended {
        config.watch.unattended = true;
    }
    if overrides.no_stdout {
        config.notify.stdout = false;
    }

    if overrides.bot.is_some() || overrides.cid.is_some() {
        let telegram = config.notify.telegram.get_or_insert_with(|| TelegramConfig {
            bot: String::new(),
            cid: String::new(),
            api_base: DEFAULT_TELEGRAM_API.to_string(),
        });
        if let Some(bot) = &overrides.bot {
            telegram.bot = bot.clone();
        }
        if let Some(cid) = &overrides.cid {
            telegram.cid = cid.clone();
        }
    }
}

/// Expands a leading `~` to the current user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };

    match (rest, BaseDirs::new()) {
        (Some(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => PathBuf::from(path),
    }
}
