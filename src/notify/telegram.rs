//! Telegram bot notifier
//!
//! Sends one `sendMessage` request per notification through the Bot API.

use super::{format_message, Notifier, NotifyError, NotifyResult};
use crate::config::TelegramConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Timeout for a single Bot API call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything but unreserved characters and `/` is escaped in the message text
const MESSAGE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Posts notifications to a Telegram chat
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
}

impl TelegramNotifier {
    /// Creates a notifier for the bot `token` writing to `chat_id`
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for the Bot API calls
    /// * `api_base` - Bot API root, normally `https://api.telegram.org`
    /// * `token` - Bot token
    /// * `chat_id` - Target chat identifier
    pub fn new(client: Client, api_base: &str, token: &str, chat_id: &str) -> Self {
        Self {
            client,
            base_url: format!(
                "{}/bot{}/sendMessage?chat_id={}",
                api_base.trim_end_matches('/'),
                token,
                chat_id
            ),
        }
    }

    /// Builds a notifier with its own HTTP client from configuration
    pub fn from_config(config: &TelegramConfig) -> NotifyResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::new(client, &config.api_base, &config.bot, &config.cid))
    }

    /// Full request URL for `text`
    ///
    /// Newlines are doubled so every link renders as its own paragraph, then
    /// the text is URL-encoded into the `text` query parameter.
    pub fn bot_link(&self, text: &str) -> String {
        let widened = text.replace('\n', "\n\n");
        let encoded = utf8_percent_encode(&widened, MESSAGE_ENCODE_SET);
        format!("{}&text={}", self.base_url, encoded)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    /// Skipped when `message` is empty: the bot only reports actual new links
    async fn notify(&self, message: &str, timestamp: &str) -> NotifyResult<()> {
        if message.is_empty() {
            return Ok(());
        }

        let link = self.bot_link(&format_message(timestamp, message));
        let response = self.client.get(&link).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
