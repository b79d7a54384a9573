use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use relay_common::config::RelayConfig;
use relay_common::types::Cursor;
use relay_notifier::{ChatLogSink, ReviewNotifier, TelegramMessenger};
use relay_poller::client::LongPollClient;
use relay_poller::policy::ErrorPolicy;
use relay_poller::runner::PollLoop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = RelayConfig::from_env()?;

    // Diagnostic chat, fed through a bounded queue
    let log_messenger = TelegramMessenger::new(
        &config.telegram_api_url,
        &config.log_bot_token,
        config.send_timeout,
    )?;
    let log_sink = ChatLogSink::new(
        Arc::new(log_messenger),
        config.log_chat_id.clone(),
        config.log_queue_capacity,
    );

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer().json().with_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "relay_poller=info,relay_notifier=info".into()),
            ),
        )
        .with(
            log_sink
                .layer()
                .with_filter(ChatLogSink::filter(config.log_chat_level)),
        )
        .init();

    let log_handle = log_sink.spawn();

    let source = LongPollClient::new(
        config.long_polling_url.clone(),
        config.devman_token.clone(),
        config.poll_timeout,
    )?;
    let messenger = TelegramMessenger::new(
        &config.telegram_api_url,
        &config.telegram_bot_token,
        config.send_timeout,
    )?;
    let notifier = ReviewNotifier::new(Arc::new(messenger), config.telegram_chat_id.clone());
    let policy = ErrorPolicy::new(config.connection_backoff)
        .with_max_consecutive_failures(config.max_consecutive_failures);

    let mut relay = PollLoop::new(source, notifier, policy, Cursor::now());

    // Run until a fatal failure or Ctrl+C
    let result = tokio::select! {
        result = relay.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping...");
            Ok(())
        }
    };

    // Make sure the last diagnostics reach the log chat before exiting
    if !log_handle.flush(Duration::from_secs(10)).await {
        tracing::debug!("Log chat flush timed out");
    }
    if log_handle.dropped() > 0 {
        tracing::debug!(dropped = log_handle.dropped(), "Diagnostics dropped by the log queue");
    }

    result?;
    Ok(())
}
