//! Error types for upstream gateway calls.

use thiserror::Error;

/// Errors that can occur while talking to the gateway.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Connection refused, DNS failure, reset before headers
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// Request timeout (control calls only)
    #[error("upstream request timed out")]
    Timeout,

    /// Non-success HTTP status on a stream endpoint
    #[error("upstream returned status {0}")]
    Status(u16),

    /// Stream endpoint answered with an empty body
    #[error("upstream returned no body")]
    NoBody,

    /// Stream broke after it was established
    #[error("upstream stream read error: {0}")]
    Read(String),

    /// Control endpoint answered with something other than JSON
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl GatewayError {
    /// Classify a reqwest error raised before the response body was read.
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Unreachable(err.to_string())
        }
    }
}
