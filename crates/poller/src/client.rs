use std::time::Duration;

use async_trait::async_trait;

use relay_common::error::PollFailure;
use relay_common::types::{Cursor, PollOutcome};

use crate::classifier::{classify, snippet};

/// Source of review outcomes, one long-poll cycle per call.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn poll(&self, cursor: Cursor) -> Result<PollOutcome, PollFailure>;
}

/// HTTP client for the review API's long-polling endpoint.
pub struct LongPollClient {
    http: reqwest::Client,
    url: String,
    token: String,
}

impl LongPollClient {
    /// `timeout` must exceed the server's hold window, otherwise every idle
    /// cycle ends in [`PollFailure::ReadTimeout`] instead of a `timeout` body.
    pub fn new(url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            url: url.into(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl ReviewSource for LongPollClient {
    async fn poll(&self, cursor: Cursor) -> Result<PollOutcome, PollFailure> {
        let response = self
            .http
            .get(&self.url)
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.token))
            .query(&[("timestamp", cursor.to_string())])
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_failure)?;

        if !status.is_success() {
            return Err(PollFailure::Http {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        classify(&body)
    }
}

/// Map a transport error onto the failure taxonomy.
///
/// Connect errors are checked first: a connect timeout is an outage, not the
/// long-poll heartbeat.
fn transport_failure(e: reqwest::Error) -> PollFailure {
    if e.is_connect() {
        PollFailure::Connection(e.to_string())
    } else if e.is_timeout() {
        PollFailure::ReadTimeout
    } else if e.is_request() || e.is_body() {
        PollFailure::Connection(e.to_string())
    } else {
        PollFailure::Unknown(e.to_string())
    }
}
