//! Notifiers for delivering newly found links
//!
//! Every sink implements [`Notifier`]. The set of sinks is built once from
//! configuration and driven by [`dispatch`], which runs each sink on its own
//! so one failing sink never keeps the others from running.

mod console;
mod file;
mod telegram;

pub use console::ConsoleNotifier;
pub use file::FileNotifier;
pub use telegram::TelegramNotifier;

use crate::config::{expand_path, NotifyConfig};
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use thiserror::Error;

/// Timestamp format used to tag every notification
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

/// Errors that can occur while delivering a notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Delivery rejected with HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Result type for notifier operations
pub type NotifyResult<T> = Result<T, NotifyError>;

/// A delivery channel for new links
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Delivers `message` tagged with `timestamp`
    ///
    /// `message` holds one link per line and may be empty when nothing new
    /// was found.
    async fn notify(&self, message: &str, timestamp: &str) -> NotifyResult<()>;
}

/// Current local time in [`TIMESTAMP_FORMAT`]
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Renders the text every sink delivers: the timestamp, then the message
///
/// Surrounding whitespace is trimmed, so an empty message leaves only the
/// timestamp.
pub fn format_message(timestamp: &str, message: &str) -> String {
    format!("{}\n{}", timestamp, message).trim().to_string()
}

/// Outcome of one dispatch round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Names of the notifiers that delivered
    pub delivered: Vec<String>,

    /// Names of the notifiers that failed, with the reason
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    /// Returns true if no notifier failed
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs every notifier once for `message`
///
/// Each notifier is awaited on its own. An error or a panic in one of them is
/// logged and recorded in the report, and the remaining ones still run.
pub async fn dispatch(
    notifiers: &[Box<dyn Notifier>],
    message: &str,
    timestamp: &str,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for notifier in notifiers {
        let name = notifier.name().to_string();
        let outcome = AssertUnwindSafe(notifier.notify(message, timestamp))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {
                tracing::debug!("Notifier {} delivered", name);
                report.delivered.push(name);
            }
            Ok(Err(e)) => {
                tracing::warn!("Notifier {} failed: {}", name, e);
                report.failed.push((name, e.to_string()));
            }
            Err(_) => {
                tracing::error!("Notifier {} panicked", name);
                report.failed.push((name, "panicked".to_string()));
            }
        }
    }

    report
}

/// Builds the configured set of notifiers
///
/// Order is console, file, Telegram. The console sink is left out entirely
/// when running unattended.
///
/// # Returns
///
/// * `Ok(Vec<Box<dyn Notifier>>)` - The enabled notifiers (possibly none)
/// * `Err(NotifyError)` - The Telegram HTTP client could not be built
pub fn build_notifiers(
    config: &NotifyConfig,
    unattended: bool,
) -> NotifyResult<Vec<Box<dyn Notifier>>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();

    if config.stdout && !unattended {
        notifiers.push(Box::new(ConsoleNotifier::new()));
    }

    if let Some(path) = &config.file {
        let file = FileNotifier::new(expand_path(path));
        tracing::info!("Appending new links to {}", file.path().display());
        notifiers.push(Box::new(file));
    }

    if let Some(telegram) = &config.telegram {
        notifiers.push(Box::new(TelegramNotifier::from_config(telegram)?));
    }

    if notifiers.is_empty() {
        tracing::warn!("No notifiers enabled; new links will only be recorded");
    } else {
        let names: Vec<&str> = notifiers.iter().map(|n| n.name()).collect();
        tracing::info!("Notifiers: {}", names.join(", "));
    }

    Ok(notifiers)
}
