//! Entity model for docstore.
//!
//! Defines the types the sync engine works on:
//! - [`Entity`]: a key plus generic properties, immutable once built
//! - [`IdentityStrategy`]: how an entity's cross-snapshot identity is derived
//! - [`SnapshotRecord`]: one element of a `<namespace>/<kind>.json` snapshot file

mod entity;
mod error;
mod identity;
mod snapshot;

pub use entity::Entity;
pub use error::{ModelError, ModelResult};
pub use identity::IdentityStrategy;
pub use snapshot::SnapshotRecord;
