use serde::Deserialize;

/// Default pause between poll cycles (seconds)
pub const DEFAULT_POLL_INTERVAL: u64 = 5 * 60;

/// Default HTTP request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Default Telegram Bot API endpoint
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Main configuration structure for neagent-watch
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// What to watch and how often
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Listing page URL (the source link)
    #[serde(default)]
    pub link: String,

    /// Pause between the end of one poll cycle and the start of the next (seconds)
    #[serde(default = "default_poll_interval")]
    pub timeout: u64,

    /// Running unattended in the background; disables console output
    #[serde(default)]
    pub unattended: bool,

    /// Per-request HTTP timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            link: String::new(),
            timeout: DEFAULT_POLL_INTERVAL,
            unattended: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Seen-link storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Notifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Print new links to stdout (ignored when unattended)
    #[serde(default = "default_true")]
    pub stdout: bool,

    /// Append new links to this file
    #[serde(default)]
    pub file: Option<String>,

    /// Still emit a timestamp-only entry to console/file when nothing is new
    #[serde(rename = "notify-empty", default = "default_true")]
    pub notify_empty: bool,

    /// Telegram bot settings
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            file: None,
            notify_empty: true,
            telegram: None,
        }
    }
}

/// Telegram bot settings
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token
    pub bot: String,

    /// Chat identifier
    pub cid: String,

    /// Bot API base URL
    #[serde(rename = "api-base", default = "default_telegram_api")]
    pub api_base: String,
}

/// CSS selectors used to pick links out of a listing page
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Anchors of the page-number navigation
    #[serde(default = "default_pagination_selector")]
    pub pagination: String,

    /// Anchors of the listing item thumbnails
    #[serde(default = "default_items_selector")]
    pub items: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            pagination: default_pagination_selector(),
            items: default_items_selector(),
        }
    }
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_database_path() -> String {
    "~/neagent.db".to_string()
}

fn default_telegram_api() -> String {
    DEFAULT_TELEGRAM_API.to_string()
}

fn default_pagination_selector() -> String {
    ".page_numbers a".to_string()
}

fn default_items_selector() -> String {
    ".imd_photo a".to_string()
}

fn default_true() -> bool {
    true
}
