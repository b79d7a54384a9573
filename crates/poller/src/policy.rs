//! Retry policy for failed long-poll cycles.
//!
//! | Failure        | Action                    | Diagnostic |
//! |----------------|---------------------------|------------|
//! | `ReadTimeout`  | retry immediately         | none       |
//! | `Connection`   | sleep the backoff, retry  | warning    |
//! | `Http`         | retry immediately         | error      |
//! | `Unknown`      | stop the loop             | error      |
//!
//! Read timeouts are the normal heartbeat of long polling and never count as
//! failures. Connection and HTTP failures count toward the optional
//! consecutive-failure ceiling; any successful cycle resets it.

use std::time::Duration;

use relay_common::error::{PollFailure, RelayError};
use relay_common::types::Severity;

/// What the loop should do next.
#[derive(Debug, PartialEq)]
pub enum Action {
    Retry,
    RetryAfter(Duration),
    Abort(RelayError),
}

/// A record the loop should log on the policy's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub diagnostic: Option<Diagnostic>,
}

/// Failure-class state machine driving retries and backoff.
#[derive(Debug)]
pub struct ErrorPolicy {
    connection_backoff: Duration,
    max_consecutive_failures: Option<u32>,
    connection_lost: bool,
    consecutive_failures: u32,
}

impl ErrorPolicy {
    pub fn new(connection_backoff: Duration) -> Self {
        Self {
            connection_backoff,
            max_consecutive_failures: None,
            connection_lost: false,
            consecutive_failures: 0,
        }
    }

    /// Give up once `limit` connection/HTTP failures happen in a row.
    pub fn with_max_consecutive_failures(mut self, limit: Option<u32>) -> Self {
        self.max_consecutive_failures = limit;
        self
    }

    pub fn connection_lost(&self) -> bool {
        self.connection_lost
    }

    /// Record a successful cycle. Reports a recovered connection once.
    pub fn on_success(&mut self) -> Option<Diagnostic> {
        self.consecutive_failures = 0;
        if std::mem::take(&mut self.connection_lost) {
            Some(Diagnostic::new(
                Severity::Info,
                "Connection to the review API restored",
            ))
        } else {
            None
        }
    }

    pub fn on_failure(&mut self, failure: PollFailure) -> Decision {
        match failure {
            PollFailure::ReadTimeout => Decision {
                action: Action::Retry,
                diagnostic: None,
            },
            PollFailure::Unknown(_) => Decision {
                diagnostic: Some(Diagnostic::new(
                    Severity::Error,
                    format!("Relay stopped. {failure}"),
                )),
                action: Action::Abort(RelayError::Fatal(failure)),
            },
            PollFailure::Connection(_) | PollFailure::Http { .. } => self.on_retryable(failure),
        }
    }

    fn on_retryable(&mut self, failure: PollFailure) -> Decision {
        self.consecutive_failures += 1;
        if matches!(failure, PollFailure::Connection(_)) {
            self.connection_lost = true;
        }

        if let Some(limit) = self.max_consecutive_failures {
            if self.consecutive_failures >= limit {
                return Decision {
                    diagnostic: Some(Diagnostic::new(
                        Severity::Error,
                        format!(
                            "Giving up after {} consecutive failures: {failure}",
                            self.consecutive_failures
                        ),
                    )),
                    action: Action::Abort(RelayError::RetriesExhausted {
                        attempts: self.consecutive_failures,
                        last: failure,
                    }),
                };
            }
        }

        match failure {
            PollFailure::Connection(detail) => Decision {
                action: Action::RetryAfter(self.connection_backoff),
                diagnostic: Some(Diagnostic::new(
                    Severity::Warning,
                    format!(
                        "Cannot connect to the review API, retrying in {}s: {detail}",
                        self.connection_backoff.as_secs()
                    ),
                )),
            },
            other => Decision {
                action: Action::Retry,
                diagnostic: Some(Diagnostic::new(
                    Severity::Error,
                    format!("Review API request failed: {other}"),
                )),
            },
        }
    }
}
