use std::sync::Arc;

use relay_common::error::SendError;
use relay_common::types::ReviewEvent;

use crate::messenger::Messenger;

/// Turns review events into chat messages for the student's chat.
#[derive(Clone)]
pub struct ReviewNotifier {
    messenger: Arc<dyn Messenger>,
    chat_id: String,
}

impl ReviewNotifier {
    pub fn new(messenger: Arc<dyn Messenger>, chat_id: impl Into<String>) -> Self {
        Self {
            messenger,
            chat_id: chat_id.into(),
        }
    }

    /// Send one notification for `event`. Send failures are returned as-is.
    pub async fn notify(&self, event: &ReviewEvent) -> Result<(), SendError> {
        let text = Self::render(event);
        self.messenger.send_text(&self.chat_id, &text).await?;

        tracing::debug!(
            lesson = %event.lesson_title,
            rejected = event.is_rejected,
            "Review notification sent"
        );
        Ok(())
    }

    /// Message text for a review event.
    pub fn render(event: &ReviewEvent) -> String {
        let verdict = if event.is_rejected {
            "Unfortunately, the reviewer found errors in your work."
        } else {
            "The reviewer found no issues, you can move on to the next lesson."
        };

        format!(
            "Your work «{}» has been reviewed!\n\n{}\nLink to the work: {}",
            event.lesson_title, verdict, event.lesson_url
        )
    }
}
