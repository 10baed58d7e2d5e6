//! Chat notifications.
//!
//! [`Messenger`] is the send-message capability of a chat transport;
//! [`TelegramMessenger`] implements it over the Telegram Bot API
//! `sendMessage` method. [`notify`] is the isolation boundary used by the
//! poller: delivery failures are logged and swallowed.

use async_trait::async_trait;

use crate::client::http_client;
use crate::config::Config;
use crate::error::{HwbotError, Result};

/// A transport able to deliver a plain-text message to a chat.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends `text` to the chat identified by `chat_id`.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Telegram Bot API transport.
///
/// API endpoint: `<api_base>/bot<token>/sendMessage`.
pub struct TelegramMessenger {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl std::fmt::Debug for TelegramMessenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramMessenger")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl TelegramMessenger {
    /// Creates a messenger around an existing `reqwest::Client`.
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            bot_token: bot_token.into(),
        }
    }

    /// Creates a messenger from configuration, applying the request timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http_client(config)?;
        Ok(Self::new(
            client,
            config.chat_api_base.clone(),
            config.credentials.chat_bot_token(),
        ))
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        // The URL embeds the bot token, so it is stripped from transport errors.
        let response = self
            .client
            .post(self.send_message_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| HwbotError::notification(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(HwbotError::notification(format!(
                "chat API returned HTTP {status}: {body}"
            )));
        }

        Ok(())
    }
}

/// Sends `message` and swallows any delivery failure.
///
/// Returns `true` when the message was delivered. A failure is logged at
/// error level and never propagated, so a broken chat transport cannot stop
/// the polling loop.
pub async fn notify<M>(messenger: &M, chat_id: &str, message: &str) -> bool
where
    M: Messenger + ?Sized,
{
    match messenger.send_message(chat_id, message).await {
        Ok(()) => {
            tracing::debug!(chat_id, "Message sent");
            true
        }
        Err(error) => {
            tracing::error!(chat_id, error = %error, "Message was not sent");
            false
        }
    }
}
