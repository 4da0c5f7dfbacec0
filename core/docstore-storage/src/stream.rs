use crate::{KindQuery, RawEntity, RemoteStore, StoreResult};
use std::collections::VecDeque;
use tracing::debug;

/// A lazy, forward-only sequence over a kind query.
///
/// Batches are fetched only when the buffered one is exhausted. After the
/// final batch, or after an error, the stream yields `None`.
pub struct QueryStream<'a> {
    store: &'a dyn RemoteStore,
    query: KindQuery,
    buffer: VecDeque<RawEntity>,
    cursor: Option<String>,
    started: bool,
    finished: bool,
}

impl<'a> QueryStream<'a> {
    pub fn new(store: &'a dyn RemoteStore, query: KindQuery) -> Self {
        Self {
            store,
            query,
            buffer: VecDeque::new(),
            cursor: None,
            started: false,
            finished: false,
        }
    }

    /// The query this stream runs.
    pub fn query(&self) -> &KindQuery {
        &self.query
    }

    /// Yields the next entity, fetching a batch if needed.
    pub async fn next(&mut self) -> Option<StoreResult<RawEntity>> {
        loop {
            if let Some(entity) = self.buffer.pop_front() {
                return Some(Ok(entity));
            }
            if self.finished || (self.started && self.cursor.is_none()) {
                self.finished = true;
                return None;
            }

            self.started = true;
            match self.store.run_query(&self.query, self.cursor.as_deref()).await {
                Ok(batch) => {
                    debug!(
                        "{}: fetched {} {} entities",
                        self.store.name(),
                        batch.entities.len(),
                        self.query.kind
                    );
                    self.buffer.extend(batch.entities);
                    self.cursor = batch.next_cursor;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }

    /// Drains the stream, stopping at the first error.
    pub async fn collect_all(mut self) -> StoreResult<Vec<RawEntity>> {
        let mut out = Vec::new();
        while let Some(entity) = self.next().await {
            out.push(entity?);
        }
        Ok(out)
    }
}
