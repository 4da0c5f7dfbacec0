//! Remote store layer for docstore.
//!
//! The sync engine talks to the store only through [`RemoteStore`]:
//!
//! - [`RemoteStore::run_query`] returns one batch of a kind query plus a
//!   cursor for the next batch; [`QueryStream`] turns that into a lazy
//!   forward-only sequence.
//! - [`RemoteStore::get`] and [`RemoteStore::put`] read and write single
//!   entities by key.
//!
//! Two backends are provided: [`MemoryStore`] for tests and local runs, and
//! [`RestStore`], which speaks the Datastore v1 REST protocol (including the
//! local emulator).

mod error;
mod memory;
mod rest;
mod store;
mod stream;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use rest::{RestConfig, RestStore};
pub use store::{KindQuery, QueryBatch, RawEntity, RemoteStore};
pub use stream::QueryStream;
