//! Console notifier

use super::{format_message, Notifier, NotifyResult};
use async_trait::async_trait;
use std::io::Write;

/// Prints notifications to standard output
///
/// Only built for attended runs; see [`super::build_notifiers`].
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        "console"
    }

    async fn notify(&self, message: &str, timestamp: &str) -> NotifyResult<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", format_message(timestamp, message))?;
        stdout.flush()?;
        Ok(())
    }
}
