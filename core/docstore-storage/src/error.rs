//! Error types for the store layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur talking to a remote store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The store answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// An entity could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] docstore_codec::CodecError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A failure injected by [`crate::MemoryStore`].
    #[error("injected failure for {0}")]
    Injected(String),
}
