use crate::{KindQuery, QueryBatch, RawEntity, RemoteStore, StoreError, StoreResult};
use async_trait::async_trait;
use docstore_types::{EntityKey, KeyId, PropertyMap};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

const DEFAULT_BATCH_SIZE: usize = 100;

type PathKey = Vec<(String, Option<KeyId>)>;

#[derive(Default)]
struct State {
    // (namespace, kind) -> entities ordered by key path.
    partitions: BTreeMap<(String, String), BTreeMap<PathKey, RawEntity>>,
    next_id: i64,
    puts: usize,
    failing: HashSet<String>,
    // (namespace, kind) pairs whose queries fail.
    failing_queries: HashSet<(String, String)>,
}

/// An in-process store.
///
/// Entities of a kind come back ordered by key path, in batches of
/// `batch_size`. Incomplete keys are completed with sequential numeric ids.
/// Individual keys can be made to fail with [`MemoryStore::fail_on`], whole
/// kinds with [`MemoryStore::fail_queries`].
pub struct MemoryStore {
    name: String,
    batch_size: usize,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            state: Mutex::new(State {
                next_id: 1,
                ..State::default()
            }),
        }
    }

    /// Sets the query batch size (at least 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds an entity without counting it as a put. Returns the complete key.
    pub fn insert(&self, key: EntityKey, properties: PropertyMap) -> EntityKey {
        let mut state = self.lock();
        Self::store(&mut state, key, properties)
    }

    /// Every `get` or `put` of `key` fails from now on.
    pub fn fail_on(&self, key: &EntityKey) {
        self.lock().failing.insert(key.to_string());
    }

    /// Every query of `kind` in `namespace` fails from now on.
    pub fn fail_queries(&self, kind: &str, namespace: &str) {
        self.lock().failing_queries.insert((namespace.to_string(), kind.to_string()));
    }

    /// Number of successful `put` calls so far.
    pub fn put_count(&self) -> usize {
        self.lock().puts
    }

    /// A snapshot of all entities of one kind, in key order.
    pub fn entities(&self, kind: &str, namespace: &str) -> Vec<RawEntity> {
        self.lock()
            .partitions
            .get(&(namespace.to_string(), kind.to_string()))
            .map(|entities| entities.values().cloned().collect())
            .unwrap_or_default()
    }

    fn store(state: &mut State, mut key: EntityKey, properties: PropertyMap) -> EntityKey {
        match &key.id {
            None => {
                key.id = Some(KeyId::Id(state.next_id));
                state.next_id += 1;
            }
            Some(KeyId::Id(id)) if *id >= state.next_id => state.next_id = id + 1,
            Some(_) => {}
        }

        let partition = state
            .partitions
            .entry((key.namespace.clone(), key.kind.clone()))
            .or_default();
        partition.insert(
            path_key(&key),
            RawEntity {
                key: key.clone(),
                properties,
            },
        );
        key
    }

    fn check(state: &State, key: &EntityKey) -> StoreResult<()> {
        let rendered = key.to_string();
        if state.failing.contains(&rendered) {
            return Err(StoreError::Injected(rendered));
        }
        Ok(())
    }
}

fn path_key(key: &EntityKey) -> PathKey {
    key.path()
        .into_iter()
        .map(|(kind, id)| (kind.to_string(), id.cloned()))
        .collect()
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_query(&self, query: &KindQuery, cursor: Option<&str>) -> StoreResult<QueryBatch> {
        let offset = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| StoreError::InvalidResponse(format!("bad cursor {c:?}")))?,
            None => 0,
        };

        let state = self.lock();
        let partition_key = (query.namespace.clone(), query.kind.clone());
        if state.failing_queries.contains(&partition_key) {
            return Err(StoreError::Injected(format!("query {}/{}", query.namespace, query.kind)));
        }
        let Some(partition) = state.partitions.get(&partition_key) else {
            return Ok(QueryBatch::default());
        };

        let entities: Vec<RawEntity> = partition
            .values()
            .skip(offset)
            .take(self.batch_size)
            .cloned()
            .collect();
        let consumed = offset + entities.len();
        let next_cursor = (consumed < partition.len()).then(|| consumed.to_string());
        Ok(QueryBatch {
            entities,
            next_cursor,
        })
    }

    async fn get(&self, key: &EntityKey) -> StoreResult<Option<RawEntity>> {
        let state = self.lock();
        Self::check(&state, key)?;
        Ok(state
            .partitions
            .get(&(key.namespace.clone(), key.kind.clone()))
            .and_then(|partition| partition.get(&path_key(key)))
            .cloned())
    }

    async fn put(&self, key: &EntityKey, properties: &PropertyMap) -> StoreResult<EntityKey> {
        let mut state = self.lock();
        Self::check(&state, key)?;
        let stored = Self::store(&mut state, key.clone(), properties.clone());
        state.puts += 1;
        Ok(stored)
    }
}
