//! Snapshot directory layout: `<root>/<namespace-dir>/<kind>.json`.

use crate::sink::ReportSink;
use crate::{SyncError, SyncResult};
use docstore_model::{Entity, SnapshotRecord};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name used for the default (empty) namespace.
pub const DEFAULT_NAMESPACE_DIR: &str = "_default";

/// Name of the review directory inside a changes directory. Never scanned.
pub const REVIEW_DIR_NAME: &str = "dry_run";

/// The directory name for `namespace`.
pub fn namespace_dir(namespace: &str) -> &str {
    if namespace.is_empty() {
        DEFAULT_NAMESPACE_DIR
    } else {
        namespace
    }
}

/// The namespace a directory name stands for.
pub fn namespace_from_dir(dir: &str) -> &str {
    if dir == DEFAULT_NAMESPACE_DIR {
        ""
    } else {
        dir
    }
}

/// Where the snapshot of `(namespace, kind)` lives under `root`.
pub fn snapshot_path(root: &Path, namespace: &str, kind: &str) -> PathBuf {
    root.join(namespace_dir(namespace)).join(format!("{kind}.json"))
}

/// One snapshot file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotFile {
    pub namespace: String,
    pub kind: String,
    pub path: PathBuf,
}

/// Lists the snapshot files under `root`, sorted by namespace then kind.
///
/// Only `*.json` files one level below a namespace directory count. Plain
/// files at the top level and the review directory are ignored.
pub fn scan_snapshot_dir(root: &Path) -> SyncResult<Vec<SnapshotFile>> {
    let mut files = Vec::new();
    for ns_entry in fs::read_dir(root).map_err(SyncError::io(root))? {
        let ns_entry = ns_entry.map_err(SyncError::io(root))?;
        let ns_path = ns_entry.path();
        if !ns_path.is_dir() {
            continue;
        }
        let Some(dir_name) = ns_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if dir_name == REVIEW_DIR_NAME {
            continue;
        }
        let namespace = namespace_from_dir(dir_name).to_string();

        for entry in fs::read_dir(&ns_path).map_err(SyncError::io(&ns_path))? {
            let path = entry.map_err(SyncError::io(&ns_path))?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(kind) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            files.push(SnapshotFile {
                namespace: namespace.clone(),
                kind: kind.to_string(),
                path: path.clone(),
            });
        }
    }
    files.sort();
    Ok(files)
}

/// Reads a snapshot file into entities.
///
/// The file must hold a JSON array. Elements that are not valid records,
/// or whose parent chain is malformed, are skipped and reported.
pub fn read_snapshot_file(file: &SnapshotFile, sink: &dyn ReportSink) -> SyncResult<Vec<Entity>> {
    let text = fs::read_to_string(&file.path).map_err(SyncError::io(&file.path))?;
    let items: Vec<Value> = serde_json::from_str(&text)?;

    let ns = namespace_dir(&file.namespace);
    let mut entities = Vec::with_capacity(items.len());
    for (position, item) in items.into_iter().enumerate() {
        let best_id = item
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<none>")
            .to_string();
        let parsed = serde_json::from_value::<SnapshotRecord>(item)
            .map_err(SyncError::from)
            .and_then(|record| {
                record
                    .to_entity(&file.namespace, &file.kind)
                    .map_err(SyncError::from)
            });
        match parsed {
            Ok(entity) => entities.push(entity),
            Err(e) => sink.warn(&format!(
                "{ns}/{}/{best_id}: record #{position} skipped: {e}",
                file.kind
            )),
        }
    }
    Ok(entities)
}

/// Writes `entities` as the snapshot of `(namespace, kind)` under `root`.
pub fn write_snapshot_file(
    root: &Path,
    namespace: &str,
    kind: &str,
    entities: &[Entity],
) -> SyncResult<PathBuf> {
    let path = snapshot_path(root, namespace, kind);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(SyncError::io(dir))?;
    }
    let records: Vec<SnapshotRecord> = entities.iter().map(SnapshotRecord::from_entity).collect();
    let text = serde_json::to_string_pretty(&records)?;
    fs::write(&path, text).map_err(SyncError::io(&path))?;
    Ok(path)
}
