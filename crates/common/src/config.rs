use std::time::Duration;

use tracing::Level;

const DEFAULT_LONG_POLLING_URL: &str = "https://dvmn.org/api/long_polling/";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Relay configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Devman API token, sent as `Authorization: Token <token>`
    pub devman_token: String,

    /// Long-polling endpoint of the review API
    pub long_polling_url: String,

    /// Telegram bot token used for review notifications
    pub telegram_bot_token: String,

    /// Chat that receives review notifications
    pub telegram_chat_id: String,

    /// Bot token for diagnostic records (defaults to the notification bot)
    pub log_bot_token: String,

    /// Chat that receives diagnostic records (defaults to the notification chat)
    pub log_chat_id: String,

    /// Base URL of the Telegram Bot API
    pub telegram_api_url: String,

    /// Client-side timeout of one long-poll request (default: 120s, longer than the server's hold window)
    pub poll_timeout: Duration,

    /// Sleep before retrying after a connection failure (default: 10s)
    pub connection_backoff: Duration,

    /// Timeout for one outbound chat message (default: 30s)
    pub send_timeout: Duration,

    /// Stop after this many consecutive connection/HTTP failures. `None` retries forever.
    pub max_consecutive_failures: Option<u32>,

    /// Minimum level forwarded to the diagnostic chat (default: warn)
    pub log_chat_level: Level,

    /// Capacity of the diagnostic delivery queue (default: 64)
    pub log_queue_capacity: usize,
}

impl RelayConfig {
    /// Load configuration from environment variables (and `.env`, if present).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))
        };

        let telegram_bot_token = required("TG_TOKEN")?;
        let telegram_chat_id = required("TG_CHAT_ID")?;

        Ok(Self {
            devman_token: required("DEVMAN_TOKEN")?,
            long_polling_url: lookup("LONG_POLLING_URL")
                .unwrap_or_else(|| DEFAULT_LONG_POLLING_URL.to_string()),
            log_bot_token: lookup("TG_LOG_BOT_TOKEN").unwrap_or_else(|| telegram_bot_token.clone()),
            log_chat_id: lookup("TG_LOG_CHAT_ID").unwrap_or_else(|| telegram_chat_id.clone()),
            telegram_bot_token,
            telegram_chat_id,
            telegram_api_url: lookup("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            poll_timeout: Duration::from_secs(parse_or(&lookup, "POLL_TIMEOUT_SECS", 120)?),
            connection_backoff: Duration::from_secs(parse_or(
                &lookup,
                "CONNECTION_BACKOFF_SECS",
                10,
            )?),
            send_timeout: Duration::from_secs(parse_or(&lookup, "SEND_TIMEOUT_SECS", 30)?),
            max_consecutive_failures: lookup("MAX_CONSECUTIVE_FAILURES")
                .map(|value| {
                    value.parse::<u32>().map_err(|_| {
                        anyhow::anyhow!("MAX_CONSECUTIVE_FAILURES must be a valid u32")
                    })
                })
                .transpose()?,
            log_chat_level: lookup("LOG_CHAT_LEVEL")
                .unwrap_or_else(|| "warn".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("LOG_CHAT_LEVEL must be one of trace, debug, info, warn, error"))?,
            log_queue_capacity: parse_or(&lookup, "LOG_QUEUE_CAPACITY", 64)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} must be a valid {}", std::any::type_name::<T>())),
        None => Ok(default),
    }
}
