//! Diagnostic log forwarding to a chat.
//!
//! [`ChatLogLayer`] is a `tracing` layer that formats each event and pushes it
//! onto a bounded queue without blocking. A background task owned by
//! [`LogSinkHandle`] drains the queue and delivers the records through a
//! [`Messenger`]. Delivery is best-effort: a full queue drops the record, a
//! failed send is swallowed. Nothing on this path emits `tracing` events of
//! its own, so the sink can never feed itself.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::{Context, Layer};

use crate::messenger::Messenger;

/// Crates whose diagnostics are forwarded to the log chat.
const FORWARDED_TARGETS: &[&str] = &["relay_poller", "relay_notifier"];

enum LogCommand {
    Record(String),
    Flush(oneshot::Sender<()>),
}

/// Chat-backed log sink, split into a layer and a delivery task.
pub struct ChatLogSink {
    messenger: Arc<dyn Messenger>,
    chat_id: String,
    sender: mpsc::Sender<LogCommand>,
    receiver: mpsc::Receiver<LogCommand>,
    dropped: Arc<AtomicU64>,
}

impl ChatLogSink {
    pub fn new(messenger: Arc<dyn Messenger>, chat_id: impl Into<String>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            messenger,
            chat_id: chat_id.into(),
            sender,
            receiver,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A layer feeding this sink. Combine it with [`ChatLogSink::filter`].
    pub fn layer(&self) -> ChatLogLayer {
        ChatLogLayer {
            sender: self.sender.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Per-layer filter: only this application's crates, at `level` and above.
    pub fn filter(level: Level) -> Targets {
        FORWARDED_TARGETS
            .iter()
            .fold(Targets::new(), |targets, target| targets.with_target(*target, level))
    }

    /// Start delivering queued records. Must be called inside a tokio runtime.
    pub fn spawn(self) -> LogSinkHandle {
        let ChatLogSink {
            messenger,
            chat_id,
            sender,
            mut receiver,
            dropped,
        } = self;

        tokio::spawn(async move {
            while let Some(command) = receiver.recv().await {
                match command {
                    LogCommand::Record(text) => deliver(messenger.as_ref(), &chat_id, &text).await,
                    LogCommand::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
        });

        LogSinkHandle { sender, dropped }
    }
}

/// Forward one formatted record. Never fails: delivery errors are discarded.
pub async fn deliver(messenger: &dyn Messenger, chat_id: &str, text: &str) {
    let _ = messenger.send_text(chat_id, text).await;
}

/// Handle to the running delivery task.
pub struct LogSinkHandle {
    sender: mpsc::Sender<LogCommand>,
    dropped: Arc<AtomicU64>,
}

impl LogSinkHandle {
    /// Wait until every record queued before this call has been handled.
    ///
    /// Returns `false` if that did not happen within `timeout`.
    pub async fn flush(&self, timeout: Duration) -> bool {
        let (ack, done) = oneshot::channel();
        let flushed = async {
            self.sender.send(LogCommand::Flush(ack)).await.ok()?;
            done.await.ok()
        };
        matches!(tokio::time::timeout(timeout, flushed).await, Ok(Some(())))
    }

    /// Records discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// `tracing` layer that queues formatted events for chat delivery.
pub struct ChatLogLayer {
    sender: mpsc::Sender<LogCommand>,
    dropped: Arc<AtomicU64>,
}

impl<S: Subscriber> Layer<S> for ChatLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let text = visitor.render(*metadata.level(), metadata.target());
        if self.sender.try_send(LogCommand::Record(text)).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    fields: Vec<String>,
}

impl RecordVisitor {
    fn render(&self, level: Level, target: &str) -> String {
        let mut text = format!("{level} {target}: {}", self.message);
        for field in &self.fields {
            text.push('\n');
            text.push_str(field);
        }
        text
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}
