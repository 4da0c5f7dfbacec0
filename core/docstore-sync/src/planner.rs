//! Matching source entities to target entities and diffing them.

use crate::sink::ReportSink;
use docstore_model::{Entity, IdentityStrategy};
use docstore_types::GenericValue;
use std::collections::BTreeMap;

/// One property whose source value differs from the target.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffRecord {
    pub identity: String,
    pub field: String,
    pub local_value: GenericValue,
    /// The target value, or `String("")` when the target has no such
    /// property or no counterpart at all.
    pub remote_value: GenericValue,
}

/// Diffs `source` against its counterpart.
///
/// Every source property is compared as a whole against the target property
/// of the same name; properties only the target has are not reported. With
/// no counterpart every source property is a difference.
pub fn diff_entity(identity: &str, source: &Entity, target: Option<&Entity>) -> Vec<DiffRecord> {
    source
        .properties
        .iter()
        .filter_map(|(field, local)| {
            let remote = target
                .and_then(|t| t.get(field))
                .cloned()
                .unwrap_or_else(GenericValue::empty);
            if target.is_some() && *local == remote {
                return None;
            }
            Some(DiffRecord {
                identity: identity.to_string(),
                field: field.clone(),
                local_value: local.clone(),
                remote_value: remote,
            })
        })
        .collect()
}

/// A source entity whose identity could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntity {
    /// `namespace/kind/id` of the entity.
    pub context: String,
    pub reason: String,
}

impl SkippedEntity {
    fn new(entity: &Entity, reason: impl ToString) -> Self {
        Self {
            context: entity.context(),
            reason: reason.to_string(),
        }
    }
}

/// Target entities by identity.
#[derive(Debug, Default)]
pub struct TargetIndex {
    entries: BTreeMap<String, Entity>,
    skipped: Vec<SkippedEntity>,
}

impl TargetIndex {
    /// Indexes the complete target set.
    ///
    /// Entities whose identity cannot be extracted are left out. On a
    /// duplicate identity the first entity wins.
    pub fn build(
        strategy: &IdentityStrategy,
        targets: impl IntoIterator<Item = Entity>,
        sink: &dyn ReportSink,
    ) -> Self {
        let mut index = Self::default();
        for entity in targets {
            let identity = match strategy.extract(&entity) {
                Ok(identity) => identity,
                Err(e) => {
                    sink.warn(&format!("{}: target skipped: {e}", entity.context()));
                    index.skipped.push(SkippedEntity::new(&entity, e));
                    continue;
                }
            };
            if let Some(first) = index.entries.get(&identity) {
                sink.warn(&format!(
                    "{}: duplicate identity {identity:?}, keeping {}",
                    entity.context(),
                    first.context()
                ));
                continue;
            }
            index.entries.insert(identity, entity);
        }
        index
    }

    pub fn get(&self, identity: &str) -> Option<&Entity> {
        self.entries.get(identity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Targets left out because their identity failed.
    pub fn skipped(&self) -> &[SkippedEntity] {
        &self.skipped
    }
}

/// A source entity with its match result.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedEntity {
    pub identity: String,
    pub entity: Entity,
    /// No counterpart exists in the target.
    pub is_new: bool,
    pub diffs: Vec<DiffRecord>,
}

impl PlannedEntity {
    pub fn pending_write(&self) -> bool {
        self.is_new || !self.diffs.is_empty()
    }
}

/// The outcome of planning one kind.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub entities: Vec<PlannedEntity>,
    pub skipped: Vec<SkippedEntity>,
}

impl SyncPlan {
    /// Entities that need a write.
    pub fn pending(&self) -> impl Iterator<Item = &PlannedEntity> {
        self.entities.iter().filter(|e| e.pending_write())
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    /// All difference records, one per changed field.
    pub fn diffs(&self) -> impl Iterator<Item = &DiffRecord> {
        self.entities.iter().flat_map(|e| e.diffs.iter())
    }
}

/// Plans the writes that bring a target in line with a source.
pub struct Planner<'a> {
    strategy: IdentityStrategy,
    sink: &'a dyn ReportSink,
}

impl<'a> Planner<'a> {
    pub fn new(strategy: IdentityStrategy, sink: &'a dyn ReportSink) -> Self {
        Self { strategy, sink }
    }

    pub fn strategy(&self) -> &IdentityStrategy {
        &self.strategy
    }

    /// Matches every source entity against `index` and diffs it.
    ///
    /// A source with an empty identity (a new entity under the key
    /// strategy) never matches.
    pub fn plan(&self, sources: impl IntoIterator<Item = Entity>, index: &TargetIndex) -> SyncPlan {
        let mut plan = SyncPlan::default();
        for entity in sources {
            let identity = match self.strategy.extract(&entity) {
                Ok(identity) => identity,
                Err(e) => {
                    self.sink.warn(&format!("{}: skipped: {e}", entity.context()));
                    plan.skipped.push(SkippedEntity::new(&entity, e));
                    continue;
                }
            };

            let target = if identity.is_empty() {
                None
            } else {
                index.get(&identity)
            };
            let diffs = diff_entity(&identity, &entity, target);
            let is_new = target.is_none();

            if is_new {
                self.sink.info(&format!(
                    "{}: new entity ({} properties)",
                    entity.context(),
                    diffs.len()
                ));
            } else {
                for diff in &diffs {
                    self.sink.debug(&format!("{}: {} changed", entity.context(), diff.field));
                }
            }

            plan.entities.push(PlannedEntity {
                identity,
                entity,
                is_new,
                diffs,
            });
        }
        plan
    }
}
