//! Outbound side of the relay: review notifications and the diagnostic log chat.

pub mod log_sink;
pub mod messenger;
pub mod notifier;

pub use log_sink::{ChatLogLayer, ChatLogSink, LogSinkHandle};
pub use messenger::{Messenger, TelegramMessenger};
pub use notifier::ReviewNotifier;
