use thiserror::Error;

/// Why a long-poll cycle did not produce an outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PollFailure {
    /// Our own request timeout fired before the server answered.
    #[error("Read timeout while waiting for the review API")]
    ReadTimeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// Anything the client does not know how to handle. Fatal.
    #[error("Unexpected poll failure: {0}")]
    Unknown(String),
}

/// Failure to deliver a chat message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SendError {
    #[error("Send timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Messenger API error {status}: {description}")]
    Api { status: u16, description: String },
}

/// Reasons the relay loop stops on its own.
#[derive(Debug, PartialEq, Error)]
pub enum RelayError {
    #[error("Fatal poll failure: {0}")]
    Fatal(PollFailure),

    #[error("Gave up after {attempts} consecutive failures, last: {last}")]
    RetriesExhausted { attempts: u32, last: PollFailure },
}
