//! Error types for the sync layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// Only [`SyncError::Config`] and directory-level I/O stop a run. Per-entity
/// failures are logged through the report sink and the run continues.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote store error.
    #[error("store error: {0}")]
    Store(#[from] docstore_storage::StoreError),

    /// Value conversion error.
    #[error("codec error: {0}")]
    Codec(#[from] docstore_codec::CodecError),

    /// Entity model error.
    #[error("model error: {0}")]
    Model(#[from] docstore_model::ModelError),

    /// File system error.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
