use crate::planner::{diff_entity, SkippedEntity, SyncPlan};
use crate::sink::ReportSink;
use docstore_codec::{properties_to_typed, to_generic};
use docstore_model::Entity;
use docstore_storage::{RawEntity, RemoteStore};
use docstore_types::EntityKey;

/// Whether a run writes to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Write review artifacts only.
    #[default]
    DryRun,
    /// Write pending entities to the store.
    Apply,
}

/// A write that the store rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedWrite {
    pub context: String,
    pub error: String,
}

/// What `apply_plan` did.
#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    /// Keys written, completed by the store for new entities.
    pub written: Vec<EntityKey>,
    /// Pending entities found already up to date on re-read.
    pub unchanged: usize,
    /// Entities whose properties could not be converted.
    pub skipped: Vec<SkippedEntity>,
    pub failed: Vec<FailedWrite>,
}

/// Writes every pending entity of `plan` to `store`, one at a time.
///
/// An entity with a complete key is re-read first and only written if it is
/// missing or still differs. An incomplete key asks the store for a new
/// identifier.
/// Store failures are collected and the remaining entities still run.
pub async fn apply_plan(
    store: &dyn RemoteStore,
    plan: &SyncPlan,
    sink: &dyn ReportSink,
) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();

    for planned in plan.pending() {
        let entity = &planned.entity;
        let context = entity.context();

        let properties = match properties_to_typed(&entity.properties) {
            Ok(properties) => properties,
            Err(e) => {
                sink.warn(&format!("{context}: skipped: {e}"));
                outcome.skipped.push(SkippedEntity {
                    context,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if entity.key.is_complete() {
            match store.get(&entity.key).await {
                Ok(Some(raw)) => {
                    let current = fresh_entity(raw, sink);
                    if diff_entity(&planned.identity, entity, Some(&current)).is_empty() {
                        sink.debug(&format!("{context}: already up to date"));
                        outcome.unchanged += 1;
                        continue;
                    }
                }
                // Not stored yet: written even without properties.
                Ok(None) => {}
                Err(e) => {
                    sink.warn(&format!("{context}: read before write failed: {e}"));
                    outcome.failed.push(FailedWrite {
                        context,
                        error: e.to_string(),
                    });
                    continue;
                }
            }
        }

        match store.put(&entity.key, &properties).await {
            Ok(key) => {
                if entity.key.is_complete() {
                    sink.info(&format!("{context}: updated"));
                } else {
                    sink.info(&format!("{context}: created as {key}"));
                }
                outcome.written.push(key);
            }
            Err(e) => {
                sink.warn(&format!("{context}: write failed: {e}"));
                outcome.failed.push(FailedWrite {
                    context,
                    error: e.to_string(),
                });
            }
        }
    }

    outcome
}

// Properties the generic model cannot hold are dropped, so they always
// compare as different.
fn fresh_entity(raw: RawEntity, sink: &dyn ReportSink) -> Entity {
    let mut entity = Entity::new(raw.key, Default::default());
    for (name, value) in &raw.properties {
        match to_generic(value) {
            Ok(v) => {
                entity.properties.insert(name.clone(), v);
            }
            Err(e) => sink.debug(&format!("{}: {name}: {e}", entity.context())),
        }
    }
    entity
}
