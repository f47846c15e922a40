use thiserror::Error;

/// Failures seen by a console client talking to the relay.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("failed to reach relay at {url}: {message}")]
    Connect { url: String, message: String },

    #[error("relay returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("stream read error: {0}")]
    Read(String),

    #[error("invalid response from relay: {0}")]
    InvalidResponse(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
