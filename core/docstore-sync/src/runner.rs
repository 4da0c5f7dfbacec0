//! Sequential orchestration of download, sync and comparison runs.

use crate::apply::{apply_plan, SyncMode};
use crate::config::{kind_label, KindConfig, RunConfig};
use crate::dry_run::{build_dry_run_batch, write_dry_run_batch};
use crate::planner::{Planner, TargetIndex};
use crate::report::{compare_kind, ComparisonReport};
use crate::sink::ReportSink;
use crate::snapshot_dir::{
    namespace_dir, read_snapshot_file, scan_snapshot_dir, snapshot_path, write_snapshot_file,
    SnapshotFile,
};
use crate::{SyncError, SyncResult};
use docstore_codec::properties_to_generic;
use docstore_model::{Entity, SnapshotRecord};
use docstore_storage::{KindQuery, QueryStream, RemoteStore, StoreError};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub kinds: usize,
    pub entities_read: usize,
    pub pending: usize,
    pub written: usize,
    pub unchanged: usize,
    /// One line per entity or file left out.
    pub skipped: Vec<String>,
    pub store_errors: Vec<String>,
    /// Files written: snapshots or review artifacts.
    pub artifacts: Vec<PathBuf>,
}

impl RunSummary {
    pub fn has_store_errors(&self) -> bool {
        !self.store_errors.is_empty()
    }

    /// Logs the totals. Store errors are always listed.
    pub fn log(&self, sink: &dyn ReportSink) {
        sink.info(&format!(
            "{} kinds, {} entities read, {} pending, {} written, {} unchanged, {} skipped",
            self.kinds,
            self.entities_read,
            self.pending,
            self.written,
            self.unchanged,
            self.skipped.len()
        ));
        for artifact in &self.artifacts {
            sink.info(&format!("wrote {}", artifact.display()));
        }
        for error in &self.store_errors {
            sink.warn(&format!("store error: {error}"));
        }
    }
}

/// Runs sync operations against one store.
pub struct SyncRunner {
    store: Arc<dyn RemoteStore>,
    sink: Arc<dyn ReportSink>,
}

impl SyncRunner {
    pub fn new(store: Arc<dyn RemoteStore>, sink: Arc<dyn ReportSink>) -> Self {
        Self { store, sink }
    }

    pub fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    pub fn sink(&self) -> &dyn ReportSink {
        self.sink.as_ref()
    }

    /// Downloads every kind in `kinds` into snapshot files under `out_dir`.
    ///
    /// A kind whose query fails is reported and gets no file. Entities whose
    /// key would not read back unchanged are skipped with a log line.
    pub async fn download(&self, kinds: &[KindConfig], out_dir: &Path) -> SyncResult<RunSummary> {
        fs::create_dir_all(out_dir).map_err(SyncError::io(out_dir))?;
        let mut summary = RunSummary::default();

        for kind in kinds {
            summary.kinds += 1;
            let fetched = fetch_entities(
                self.store(),
                &kind.namespace,
                &kind.name,
                self.sink(),
                &mut summary.skipped,
            )
            .await;
            let entities = match fetched {
                Ok(entities) => entities,
                Err(e) => {
                    self.store_failed(&mut summary, &kind.namespace, &kind.name, e);
                    continue;
                }
            };
            let entities: Vec<Entity> = entities
                .into_iter()
                .filter(|entity| match SnapshotRecord::check_key(&entity.key) {
                    Ok(()) => true,
                    Err(e) => {
                        let line = format!("{}: {e}", entity.context());
                        self.sink.warn(&format!("skipped {line}"));
                        summary.skipped.push(line);
                        false
                    }
                })
                .collect();
            summary.entities_read += entities.len();
            let path = write_snapshot_file(out_dir, &kind.namespace, &kind.name, &entities)?;
            self.sink.info(&format!(
                "{}: downloaded {} entities",
                kind.label(),
                entities.len()
            ));
            summary.artifacts.push(path);
        }

        summary.log(self.sink());
        Ok(summary)
    }

    /// Plans every snapshot file under `changes_dir` against the store and
    /// either writes review artifacts to `review_dir` or applies the plan.
    ///
    /// A dry run empties `review_dir` first, so it must not be
    /// `changes_dir` or one of its ancestors.
    pub async fn sync_directory(
        &self,
        config: &RunConfig,
        changes_dir: &Path,
        mode: SyncMode,
        review_dir: &Path,
    ) -> SyncResult<RunSummary> {
        let files = scan_snapshot_dir(changes_dir)?;
        if mode == SyncMode::DryRun {
            check_review_dir(changes_dir, review_dir)?;
            reset_dir(review_dir)?;
        }

        let mut summary = RunSummary::default();
        for file in &files {
            summary.kinds += 1;
            let strategy = config.strategy_for(&file.namespace, &file.kind)?;
            let Some(sources) = self.read_file(file, &mut summary.skipped) else {
                continue;
            };
            summary.entities_read += sources.len();

            let fetched = fetch_entities(
                self.store(),
                &file.namespace,
                &file.kind,
                self.sink(),
                &mut summary.skipped,
            )
            .await;
            let targets = match fetched {
                Ok(targets) => targets,
                Err(e) => {
                    self.store_failed(&mut summary, &file.namespace, &file.kind, e);
                    continue;
                }
            };
            let index = TargetIndex::build(&strategy, targets, self.sink());
            let plan = Planner::new(strategy, self.sink()).plan(sources, &index);
            summary.pending += plan.pending_count();
            summary
                .skipped
                .extend(plan.skipped.iter().map(|s| format!("{}: {}", s.context, s.reason)));

            match mode {
                SyncMode::DryRun => {
                    let batch =
                        build_dry_run_batch(&plan, &file.namespace, &file.kind, self.sink());
                    if let Some(path) = write_dry_run_batch(review_dir, &batch)? {
                        summary.artifacts.push(path);
                    }
                }
                SyncMode::Apply => {
                    let outcome = apply_plan(self.store(), &plan, self.sink()).await;
                    summary.written += outcome.written.len();
                    summary.unchanged += outcome.unchanged;
                    summary.skipped.extend(
                        outcome
                            .skipped
                            .iter()
                            .map(|s| format!("{}: {}", s.context, s.reason)),
                    );
                    summary.store_errors.extend(
                        outcome
                            .failed
                            .iter()
                            .map(|f| format!("{}: {}", f.context, f.error)),
                    );
                }
            }
        }

        summary.log(self.sink());
        Ok(summary)
    }

    /// Compares every snapshot under `source_dir` against the file of the
    /// same namespace and kind under `target_dir`. A missing target file
    /// compares against an empty set.
    pub fn compare_directories(
        &self,
        config: &RunConfig,
        source_dir: &Path,
        target_dir: &Path,
    ) -> SyncResult<ComparisonReport> {
        let mut comparison = ComparisonReport::default();

        for file in scan_snapshot_dir(source_dir)? {
            let strategy = config.strategy_for(&file.namespace, &file.kind)?;
            let Some(sources) = self.read_file(&file, &mut comparison.skipped) else {
                continue;
            };

            let target_file = SnapshotFile {
                path: snapshot_path(target_dir, &file.namespace, &file.kind),
                ..file.clone()
            };
            let targets = if target_file.path.is_file() {
                match self.read_file(&target_file, &mut comparison.skipped) {
                    Some(targets) => targets,
                    None => continue,
                }
            } else {
                self.sink.warn(&format!(
                    "{}: no target snapshot at {}",
                    kind_label(&file.namespace, &file.kind),
                    target_file.path.display()
                ));
                Vec::new()
            };

            comparison.kinds.push(compare_kind(
                &strategy,
                &kind_label(&file.namespace, &file.kind),
                sources,
                targets,
                self.sink(),
            ));
        }

        comparison.log(self.sink());
        Ok(comparison)
    }

    fn read_file(&self, file: &SnapshotFile, skipped: &mut Vec<String>) -> Option<Vec<Entity>> {
        match read_snapshot_file(file, self.sink()) {
            Ok(entities) => Some(entities),
            Err(e) => {
                let line = format!("{}: {e}", file.path.display());
                self.sink.warn(&format!("skipped file {line}"));
                skipped.push(line);
                None
            }
        }
    }

    fn store_failed(
        &self,
        summary: &mut RunSummary,
        namespace: &str,
        kind: &str,
        error: StoreError,
    ) {
        let line = format!("{}: {error}", kind_label(namespace, kind));
        self.sink.warn(&format!("query failed for {line}"));
        summary.store_errors.push(line);
    }
}

/// Compares kinds between two stores, pairing `pairs` by position.
///
/// Matching uses the source kind's identity strategy. A kind whose query
/// fails on either side is left out of the kinds and listed as a store
/// error.
pub async fn compare_stores(
    source: &dyn RemoteStore,
    target: &dyn RemoteStore,
    pairs: &[(KindConfig, KindConfig)],
    sink: &dyn ReportSink,
) -> SyncResult<ComparisonReport> {
    let mut comparison = ComparisonReport::default();

    for (source_kind, target_kind) in pairs {
        let strategy = source_kind.strategy()?;
        let sources = fetch_entities(
            source,
            &source_kind.namespace,
            &source_kind.name,
            sink,
            &mut comparison.skipped,
        )
        .await;
        let targets = fetch_entities(
            target,
            &target_kind.namespace,
            &target_kind.name,
            sink,
            &mut comparison.skipped,
        )
        .await;
        match (sources, targets) {
            (Ok(sources), Ok(targets)) => comparison.kinds.push(compare_kind(
                &strategy,
                &source_kind.label(),
                sources,
                targets,
                sink,
            )),
            (Err(e), _) => {
                sink.warn(&format!("{}: not compared: {e}", source_kind.label()));
                comparison
                    .store_errors
                    .push(format!("{} ({}): {e}", source_kind.label(), source.name()));
            }
            (_, Err(e)) => {
                sink.warn(&format!("{}: not compared: {e}", source_kind.label()));
                comparison
                    .store_errors
                    .push(format!("{} ({}): {e}", target_kind.label(), target.name()));
            }
        }
    }

    comparison.log(sink);
    Ok(comparison)
}

// Streams one kind and converts it to entities. Entities holding values the
// generic model cannot represent are left out and noted in `skipped`.
async fn fetch_entities(
    store: &dyn RemoteStore,
    namespace: &str,
    kind: &str,
    sink: &dyn ReportSink,
    skipped: &mut Vec<String>,
) -> Result<Vec<Entity>, StoreError> {
    let mut stream = QueryStream::new(store, KindQuery::new(kind, namespace));
    let mut entities = Vec::new();
    while let Some(raw) = stream.next().await {
        let raw = raw?;
        match properties_to_generic(&raw.properties) {
            Ok(properties) => entities.push(Entity::new(raw.key, properties)),
            Err(e) => {
                let line = format!(
                    "{}/{kind}/{}: {e}",
                    namespace_dir(namespace),
                    raw.key.id_string()
                );
                sink.warn(&format!("skipped {line}"));
                skipped.push(line);
            }
        }
    }
    Ok(entities)
}

// The review directory is wiped, so it may sit inside the changes but never
// hold them.
fn check_review_dir(changes_dir: &Path, review_dir: &Path) -> SyncResult<()> {
    let changes = resolve(changes_dir)?;
    let review = resolve(review_dir)?;
    if changes.starts_with(&review) {
        return Err(SyncError::Config(format!(
            "review directory {} would remove the changes in {}",
            review_dir.display(),
            changes_dir.display()
        )));
    }
    Ok(())
}

// Absolute form of `path` with symlinks resolved for the part that exists.
fn resolve(path: &Path) -> SyncResult<PathBuf> {
    let cwd = std::env::current_dir().map_err(SyncError::io(path))?;
    let mut absolute = PathBuf::new();
    for component in cwd.join(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                absolute.pop();
            }
            other => absolute.push(other),
        }
    }

    let Some(existing) = absolute.ancestors().find(|a| a.exists()).map(Path::to_path_buf) else {
        return Ok(absolute);
    };
    let resolved = existing.canonicalize().map_err(SyncError::io(&existing))?;
    Ok(absolute
        .strip_prefix(&existing)
        .map_or_else(|_| resolved.clone(), |rest| resolved.join(rest)))
}

fn reset_dir(dir: &Path) -> SyncResult<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(SyncError::io(dir))?;
    }
    fs::create_dir_all(dir).map_err(SyncError::io(dir))
}
