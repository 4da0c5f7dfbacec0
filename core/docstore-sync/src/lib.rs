//! Differential sync engine for docstore.
//!
//! Brings a remote store in line with a directory of snapshot files, or
//! reports how two entity sets differ, without ever deleting anything.
//!
//! # Flow
//!
//! 1. **Match**: a [`TargetIndex`] maps identity to target entity, using the
//!    kind's [`IdentityStrategy`](docstore_model::IdentityStrategy).
//! 2. **Diff**: the [`Planner`] compares each source entity with its
//!    counterpart property by property and marks it new, changed or equal.
//! 3. **Act**: in [`SyncMode::DryRun`] pending entities go to a review
//!    artifact; in [`SyncMode::Apply`] they are re-checked and written.
//!
//! Comparison reports ([`compare_kind`], [`render_markdown`]) reuse the same
//! matching and diffing without touching the store.
//!
//! Per-entity problems are reported through a [`ReportSink`] and never stop
//! a run. Only configuration and directory errors are fatal.

mod apply;
pub mod config;
mod dry_run;
mod error;
mod planner;
mod report;
mod runner;
mod sink;
pub mod snapshot_dir;
pub mod textdiff;

pub use apply::{apply_plan, ApplyOutcome, FailedWrite, SyncMode};
pub use config::{EnvironmentConfig, KindConfig, ResolvedEnvironment, RunConfig, StoreSettings};
pub use dry_run::{build_dry_run_batch, write_dry_run_batch, DryRunBatch, TypedEntity};
pub use error::{SyncError, SyncResult};
pub use planner::{
    diff_entity, DiffRecord, PlannedEntity, Planner, SkippedEntity, SyncPlan, TargetIndex,
};
pub use report::{
    compare_kind, render_markdown, render_value, ComparisonReport, KindReport, ReportRow,
};
pub use runner::{compare_stores, RunSummary, SyncRunner};
pub use sink::{MemorySink, ReportSink, TracingSink};
pub use snapshot_dir::{read_snapshot_file, scan_snapshot_dir, write_snapshot_file, SnapshotFile};
