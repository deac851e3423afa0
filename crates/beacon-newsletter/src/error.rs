//! Error types for newsletter queries and fetches.

use serde_json::Value;
use thiserror::Error;

/// Normalized failure of a structured query.
///
/// Raised when the server answered with an `errors` list, or when the
/// expected data slice was missing from an otherwise readable response.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (code {code})")]
pub struct QueryError {
    /// Composed, human-readable message.
    pub message: String,
    /// Status code reported by the server, 400 when it gave none.
    pub code: u16,
    /// First error object, or the whole response on the generic path.
    pub detail: Value,
}

/// Failure reported by the transport while sending or awaiting a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("query timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Other(String),
}

/// Failure decrypting a single fetched message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to decrypt message {server_id}: {reason}")]
pub struct DecryptionError {
    pub server_id: String,
    pub reason: String,
}

/// Errors surfaced by the newsletter layer.
#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decryption(#[from] DecryptionError),

    /// Malformed JSON where well-formed JSON was required.
    #[error("invalid JSON payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required field was absent from an otherwise valid payload.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("picture encoding failed: {0}")]
    Picture(String),
}

impl NewsletterError {
    /// Status code when this is a query error.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Query(err) => Some(err.code),
            _ => None,
        }
    }
}

/// Result alias for newsletter operations.
pub type Result<T> = std::result::Result<T, NewsletterError>;
