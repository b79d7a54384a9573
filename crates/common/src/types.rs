use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Position in the review feed, echoed back to the API on every request.
///
/// The value is a Unix timestamp in seconds (possibly fractional) handed out by
/// the remote side. Apart from the initial value taken from the wall clock, the
/// client only ever uses cursors it has received.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(f64);

impl Cursor {
    pub fn new(timestamp: f64) -> Self {
        Self(timestamp)
    }

    /// Cursor for "now", used once at startup. Any backlog older than this is skipped.
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis() as f64 / 1000.0)
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One graded attempt reported by the review API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub lesson_title: String,
    /// `true` when the reviewer sent the work back with defects.
    #[serde(rename = "is_negative")]
    pub is_rejected: bool,
    pub lesson_url: String,
}

/// Successfully classified result of one long-poll request.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The server's hold window elapsed without new reviews.
    Timeout { next_cursor: Cursor },
    /// New reviews arrived. `events` is never empty.
    Found {
        next_cursor: Cursor,
        events: Vec<ReviewEvent>,
    },
}

impl PollOutcome {
    /// Cursor to send with the next request.
    pub fn next_cursor(&self) -> Cursor {
        match self {
            PollOutcome::Timeout { next_cursor } => *next_cursor,
            PollOutcome::Found { next_cursor, .. } => *next_cursor,
        }
    }
}

/// Diagnostic severity used by the retry policy and the chat log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}
