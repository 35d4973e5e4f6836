//! Error types for the LINE bot API client

use std::time::Duration;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, LineError>;

/// Errors returned by [`LineClient`](crate::LineClient).
///
/// Every failure is surfaced to the caller. The client never retries and never
/// swallows an error.
#[derive(Debug, Error)]
pub enum LineError {
    /// Invalid configuration (malformed proxy URL, unusable transport).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading the webhook body or the response body failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON could not be decoded into the expected schema.
    #[error("Decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// The outbound envelope could not be serialized.
    #[error("Encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// The serialized envelope exceeds the API request limit.
    #[error("The size of API request is too long: {size} bytes (limit {limit} bytes)")]
    PayloadTooLarge {
        /// Serialized size in bytes.
        size: usize,
        /// Maximum accepted size in bytes.
        limit: usize,
    },

    /// Transport-level failure: DNS, refused connection, TLS.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The API answered with a non-success HTTP status.
    #[error("API error: {status} - {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

impl LineError {
    /// Map a reqwest failure onto the taxonomy, given the timeout in force.
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_body() || err.is_decode() {
            Self::Io(std::io::Error::other(err))
        } else {
            Self::Network(err)
        }
    }

    /// Whether the request never reached the network.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Encode(_) | Self::PayloadTooLarge { .. }
        )
    }
}
