//! Errors surfaced by the transport layer.

use thiserror::Error;

/// Failures that end a call without a final [`Response`](super::Response).
///
/// Executor failures pass through the retry loop unchanged; only
/// [`TransportError::Aborted`] originates in the loop itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server could not be reached (DNS, connect, timeout, reset).
    #[error("Connection error: {0}")]
    Connection(String),
    /// Credentials were missing or rejected.
    #[error("Authentication failed: {0}")]
    Authentication(String),
    /// The request could not be built or was rejected as malformed before sending.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// The server answered, but not with something that could become a response.
    #[error("API error: {0}")]
    Api(String),
    /// The call was cancelled during an attempt or while waiting to retry.
    #[error("Request aborted")]
    Aborted,
}

/// A retry policy whose bounds cannot all hold at once.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Minimum retry delay ({min_ms}ms) must not exceed maximum retry delay ({max_ms}ms)")]
    InvertedBounds { min_ms: u128, max_ms: u128 },
}

impl TransportError {
    /// Maps a reqwest failure onto the taxonomy.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_builder() {
            TransportError::InvalidRequest(error.to_string())
        } else if error.is_body() || error.is_decode() {
            TransportError::Api(error.to_string())
        } else {
            TransportError::Connection(error.to_string())
        }
    }
}
