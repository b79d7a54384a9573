//! Outbound "send text to a chat" capability.
//!
//! The relay only ever needs to push plain text into a chat, so the transport
//! is hidden behind the [`Messenger`] trait. [`TelegramMessenger`] is the
//! production implementation backed by the Telegram Bot API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use relay_common::error::SendError;

/// Anything that can deliver a text message to a chat.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), SendError>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    description: Option<String>,
}

/// Telegram Bot API client (`sendMessage` only).
pub struct TelegramMessenger {
    http: reqwest::Client,
    send_url: String,
}

impl TelegramMessenger {
    /// `api_url` is the Bot API base, e.g. `https://api.telegram.org`.
    /// Every send is bounded by `timeout`.
    pub fn new(api_url: &str, bot_token: &str, timeout: Duration) -> Result<Self, SendError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SendError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            send_url: format!(
                "{}/bot{}/sendMessage",
                api_url.trim_end_matches('/'),
                bot_token
            ),
        })
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), SendError> {
        let response = self
            .http
            .post(&self.send_url)
            .json(&SendMessageRequest { chat_id, text })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Telegram explains rejections in `description`; fall back to the raw body.
        let body = response.text().await.unwrap_or_default();
        let description = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.description)
            .unwrap_or(body);

        Err(SendError::Api {
            status: status.as_u16(),
            description,
        })
    }
}

fn transport_error(e: reqwest::Error) -> SendError {
    if e.is_timeout() {
        SendError::Timeout
    } else {
        // Strip the URL: it embeds the bot token.
        SendError::Transport(e.without_url().to_string())
    }
}
