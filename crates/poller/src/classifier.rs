//! Decoding of long-poll response bodies.
//!
//! The API answers every successful request with a JSON object whose `status`
//! field tells the two shapes apart:
//!
//! - `timeout`: nothing happened during the hold window, resume from `timestamp_to_request`
//! - `found`: new reviews in `new_attempts`, resume from `last_attempt_timestamp`
//!
//! Anything else is a contract violation and is reported as [`PollFailure::Unknown`].

use serde::Deserialize;

use relay_common::error::PollFailure;
use relay_common::types::{Cursor, PollOutcome, ReviewEvent};

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum LongPollResponse {
    Timeout {
        timestamp_to_request: f64,
    },
    Found {
        last_attempt_timestamp: f64,
        new_attempts: Vec<ReviewEvent>,
    },
}

/// Classify a 2xx response body.
pub fn classify(body: &str) -> Result<PollOutcome, PollFailure> {
    let response: LongPollResponse = serde_json::from_str(body).map_err(|e| {
        PollFailure::Unknown(format!("unexpected long-poll response ({e}): {}", snippet(body)))
    })?;

    match response {
        LongPollResponse::Timeout {
            timestamp_to_request,
        } => Ok(PollOutcome::Timeout {
            next_cursor: Cursor::new(timestamp_to_request),
        }),
        LongPollResponse::Found {
            last_attempt_timestamp,
            new_attempts,
        } => {
            if new_attempts.is_empty() {
                return Err(PollFailure::Unknown(format!(
                    "`found` response without attempts: {}",
                    snippet(body)
                )));
            }
            Ok(PollOutcome::Found {
                next_cursor: Cursor::new(last_attempt_timestamp),
                events: new_attempts,
            })
        }
    }
}

/// Truncated body for diagnostics.
pub(crate) fn snippet(body: &str) -> String {
    const MAX_CHARS: usize = 500;

    if body.chars().count() <= MAX_CHARS {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX_CHARS).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unknown(body: &str) {
        match classify(body) {
            Err(PollFailure::Unknown(_)) => {}
            other => panic!("expected Unknown for {body}, got {other:?}"),
        }
    }

    #[test]
    fn test_timeout_body() {
        let outcome =
            classify(r#"{"status":"timeout","timestamp_to_request":1700000100}"#).unwrap();
        assert_eq!(
            outcome,
            PollOutcome::Timeout {
                next_cursor: Cursor::new(1700000100.0)
            }
        );
    }

    #[test]
    fn test_found_body() {
        let outcome = classify(
            r#"{
                "status": "found",
                "last_attempt_timestamp": 1700000200.5,
                "request_query": [],
                "new_attempts": [
                    {"lesson_title": "Async Python", "is_negative": true, "lesson_url": "https://x/1", "submitted_at": "2023-11-14"},
                    {"lesson_title": "Web scraping", "is_negative": false, "lesson_url": "https://x/2"}
                ]
            }"#,
        )
        .unwrap();

        match outcome {
            PollOutcome::Found {
                next_cursor,
                events,
            } => {
                assert_eq!(next_cursor, Cursor::new(1700000200.5));
                assert_eq!(events.len(), 2);
                assert_eq!(events[0].lesson_title, "Async Python");
                assert!(events[0].is_rejected);
                assert!(!events[1].is_rejected);
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_discriminator() {
        assert_unknown(r#"{"timestamp_to_request":1700000100}"#);
    }

    #[test]
    fn test_unknown_discriminator() {
        assert_unknown(r#"{"status":"pending","timestamp_to_request":1700000100}"#);
    }

    #[test]
    fn test_missing_cursor() {
        assert_unknown(r#"{"status":"timeout"}"#);
        assert_unknown(r#"{"status":"found","new_attempts":[]}"#);
    }

    #[test]
    fn test_found_without_attempts() {
        assert_unknown(r#"{"status":"found","last_attempt_timestamp":1,"new_attempts":[]}"#);
    }

    #[test]
    fn test_attempt_missing_fields() {
        assert_unknown(
            r#"{"status":"found","last_attempt_timestamp":1,"new_attempts":[{"lesson_title":"x"}]}"#,
        );
    }

    #[test]
    fn test_not_json() {
        assert_unknown("<html>maintenance</html>");
    }

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let body = "a".repeat(600);
        let short = snippet(&body);
        assert_eq!(short.chars().count(), 501);
        assert!(short.ends_with('…'));
    }
}
