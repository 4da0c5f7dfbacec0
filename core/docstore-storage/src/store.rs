//! The store seam.

use crate::StoreResult;
use async_trait::async_trait;
use docstore_types::{EntityKey, PropertyMap};

/// All entities of one kind in one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindQuery {
    pub kind: String,
    pub namespace: String,
}

impl KindQuery {
    pub fn new(kind: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
        }
    }
}

/// An entity as the store returns it: a key and typed properties.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    pub key: EntityKey,
    pub properties: PropertyMap,
}

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct QueryBatch {
    pub entities: Vec<RawEntity>,
    /// Cursor for the next batch; `None` once the query is exhausted.
    pub next_cursor: Option<String>,
}

/// A remote document store.
///
/// Calls are issued sequentially by the sync engine; implementations need
/// not support concurrent writes to the same key.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// A short name for log lines.
    fn name(&self) -> &str;

    /// Runs `query` from `cursor` (or from the start) and returns one batch.
    async fn run_query(&self, query: &KindQuery, cursor: Option<&str>) -> StoreResult<QueryBatch>;

    /// Looks up a single entity.
    async fn get(&self, key: &EntityKey) -> StoreResult<Option<RawEntity>>;

    /// Upserts an entity and returns its complete key.
    ///
    /// An incomplete key asks the store to allocate an identifier.
    async fn put(&self, key: &EntityKey, properties: &PropertyMap) -> StoreResult<EntityKey>;
}
