use relay_common::error::RelayError;
use relay_common::types::{Cursor, PollOutcome, Severity};
use relay_notifier::ReviewNotifier;

use crate::client::ReviewSource;
use crate::policy::{Action, Diagnostic, ErrorPolicy};

/// The relay's driving loop: poll, advance the cursor, notify, repeat.
///
/// The cursor only ever takes values returned by the source. On `Found` only
/// the first attempt is notified; any further attempts in the same response
/// are skipped.
pub struct PollLoop<S> {
    source: S,
    notifier: ReviewNotifier,
    policy: ErrorPolicy,
    cursor: Cursor,
}

impl<S: ReviewSource> PollLoop<S> {
    pub fn new(source: S, notifier: ReviewNotifier, policy: ErrorPolicy, cursor: Cursor) -> Self {
        Self {
            source,
            notifier,
            policy,
            cursor,
        }
    }

    /// Cursor the next poll will use.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Run until the policy gives up. Runs indefinitely otherwise.
    pub async fn run(&mut self) -> Result<(), RelayError> {
        tracing::info!(cursor = %self.cursor, "Review relay started");

        loop {
            self.step().await?;
        }
    }

    /// One poll cycle, including any backoff sleep the policy asks for.
    pub async fn step(&mut self) -> Result<(), RelayError> {
        match self.source.poll(self.cursor).await {
            Ok(outcome) => {
                if let Some(diagnostic) = self.policy.on_success() {
                    emit(&diagnostic);
                }
                self.handle_outcome(outcome).await;
                Ok(())
            }
            Err(failure) => {
                let decision = self.policy.on_failure(failure);
                if let Some(diagnostic) = &decision.diagnostic {
                    emit(diagnostic);
                }

                match decision.action {
                    Action::Retry => Ok(()),
                    Action::RetryAfter(delay) => {
                        tokio::time::sleep(delay).await;
                        Ok(())
                    }
                    Action::Abort(e) => Err(e),
                }
            }
        }
    }

    async fn handle_outcome(&mut self, outcome: PollOutcome) {
        self.cursor = outcome.next_cursor();

        match outcome {
            PollOutcome::Timeout { .. } => {
                tracing::debug!(cursor = %self.cursor, "No new reviews");
            }
            PollOutcome::Found { events, .. } => {
                let mut events = events.into_iter();
                let Some(event) = events.next() else {
                    return;
                };

                let skipped = events.len();
                if skipped > 0 {
                    tracing::debug!(skipped, "Only the first attempt of the response is notified");
                }

                tracing::info!(
                    cursor = %self.cursor,
                    lesson = %event.lesson_title,
                    rejected = event.is_rejected,
                    "Review received"
                );

                if let Err(e) = self.notifier.notify(&event).await {
                    tracing::error!(
                        error = %e,
                        lesson = %event.lesson_title,
                        "Failed to deliver review notification"
                    );
                }
            }
        }
    }
}

fn emit(diagnostic: &Diagnostic) {
    match diagnostic.severity {
        Severity::Info => tracing::info!("{}", diagnostic.message),
        Severity::Warning => tracing::warn!("{}", diagnostic.message),
        Severity::Error => tracing::error!("{}", diagnostic.message),
    }
}
