//! File notifier

use super::{format_message, Notifier, NotifyResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Appends notifications to a text file
///
/// The file is opened, appended to and closed on every call; no handle is
/// kept between poll cycles. It is created if it does not exist.
#[derive(Debug, Clone)]
pub struct FileNotifier {
    path: PathBuf,
}

impl FileNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Notifier for FileNotifier {
    fn name(&self) -> &str {
        "file"
    }

    async fn notify(&self, message: &str, timestamp: &str) -> NotifyResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let entry = format!("{}\n", format_message(timestamp, message));
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
