//! Value codec for docstore.
//!
//! Converts between the store's typed property representation
//! ([`TypedValue`](docstore_types::TypedValue)) and the generic normal form
//! ([`GenericValue`](docstore_types::GenericValue)), in both directions:
//!
//! - [`to_generic`] / [`to_typed`]: the core conversion, pure and recursive
//! - [`from_json`] / [`to_json`]: snapshot files, with numeric normalisation
//! - [`wire`]: the store's REST JSON encoding of values, keys and entities
//!
//! Every function here is free of side effects.

mod convert;
mod error;
mod json;
pub mod wire;

pub use convert::{properties_to_generic, properties_to_typed, to_generic, to_typed};
pub use error::{CodecError, CodecResult};
pub use json::{from_json, to_json};
