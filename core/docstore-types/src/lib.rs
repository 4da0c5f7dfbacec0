//! Core type definitions for docstore.
//!
//! This crate defines the store-independent types used throughout the
//! workspace:
//! - Entity keys with their ancestor chain ([`EntityKey`], [`KeyId`])
//! - The generic, JSON-friendly value model ([`GenericValue`])
//! - The store's tagged property representation ([`TypedValue`])
//!
//! Conversions between the two value models live in `docstore-codec`.

mod key;
mod value;

pub use key::{Ancestors, EntityKey, KeyId};
pub use value::{GenericValue, PropertyMap, TypedValue};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid key path: {0}")]
    InvalidKeyPath(String),
}
