//! Dry-run review artifacts.
//!
//! Instead of writing to the store, every pending entity is converted to
//! its typed form and written to `<review>/<namespace-dir>/<kind>_dry_run.json`
//! in the store's wire encoding, so a reviewer sees exactly what apply
//! would send.

use crate::planner::SyncPlan;
use crate::sink::ReportSink;
use crate::snapshot_dir::namespace_dir;
use crate::{SyncError, SyncResult};
use docstore_codec::{properties_to_typed, wire};
use docstore_types::{EntityKey, PropertyMap};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// An entity in the store's typed representation.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedEntity {
    pub key: EntityKey,
    pub properties: PropertyMap,
}

/// The would-be writes for one kind.
#[derive(Debug, Clone, Default)]
pub struct DryRunBatch {
    pub namespace: String,
    pub kind: String,
    pub entities: Vec<TypedEntity>,
}

impl DryRunBatch {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Where this batch is written under `review_dir`.
    pub fn path(&self, review_dir: &Path) -> PathBuf {
        review_dir
            .join(namespace_dir(&self.namespace))
            .join(format!("{}_dry_run.json", self.kind))
    }
}

/// Converts every pending entity of `plan`. New entities keep their
/// incomplete key. Entities that fail to convert are reported and left out.
pub fn build_dry_run_batch(
    plan: &SyncPlan,
    namespace: &str,
    kind: &str,
    sink: &dyn ReportSink,
) -> DryRunBatch {
    let entities = plan
        .pending()
        .filter_map(|planned| match properties_to_typed(&planned.entity.properties) {
            Ok(properties) => Some(TypedEntity {
                key: planned.entity.key.clone(),
                properties,
            }),
            Err(e) => {
                sink.warn(&format!("{}: skipped: {e}", planned.entity.context()));
                None
            }
        })
        .collect();

    DryRunBatch {
        namespace: namespace.to_string(),
        kind: kind.to_string(),
        entities,
    }
}

/// Writes `batch` as a pretty JSON array of wire entities.
///
/// An empty batch writes nothing and returns `None`.
pub fn write_dry_run_batch(review_dir: &Path, batch: &DryRunBatch) -> SyncResult<Option<PathBuf>> {
    if batch.is_empty() {
        return Ok(None);
    }

    let items = batch
        .entities
        .iter()
        .map(|e| wire::encode_entity(&e.key, &e.properties, None))
        .collect::<Result<Vec<Value>, _>>()?;

    let path = batch.path(review_dir);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(SyncError::io(dir))?;
    }
    fs::write(&path, serde_json::to_string_pretty(&items)?).map_err(SyncError::io(&path))?;
    Ok(Some(path))
}
