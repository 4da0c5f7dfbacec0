use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by the entity model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The identity strategy could not resolve an entity's identity.
    #[error("identity not found ({strategy}): {reason}")]
    IdentityNotFound { strategy: String, reason: String },

    /// A configuration token that names no identity strategy.
    #[error("invalid identity token {0:?}: expected \"key\", \"property:<name>\" or \"parent:<kind>\"")]
    InvalidIdentityToken(String),

    /// A snapshot `parent` field that is not `Kind,id[,Kind,id...]`.
    #[error("invalid parent {0:?}: expected \"Kind,id\" pairs")]
    InvalidParent(String),

    /// A key whose snapshot text form would read back as a different key.
    #[error("key {key} cannot be written to a snapshot: {reason}")]
    UnrepresentableKey { key: String, reason: String },

    /// A key that cannot be built.
    #[error("invalid key: {0}")]
    InvalidKey(#[from] docstore_types::Error),
}
