//! Command line surface for docstore.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docstore_storage::{RemoteStore, RestStore};
use docstore_sync::{
    compare_stores, render_markdown, ReportSink, RunConfig, StoreSettings, SyncMode,
    SyncRunner, TracingSink,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "docstore")]
#[command(about = "Download, compare and apply document store snapshots")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "docstore.toml")]
    pub config: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Download every configured kind into snapshot files
    Download {
        #[arg(long, default_value = "./output")]
        output_dir: PathBuf,
    },
    /// Compare local changes against a downloaded snapshot
    Compare {
        #[arg(long, default_value = "./output")]
        output_dir: PathBuf,
        /// Directory holding the local changes
        #[arg(long, default_value = "./local_changes")]
        against: PathBuf,
        /// Compare against the existing snapshot instead of downloading
        #[arg(long)]
        skip_download: bool,
        /// Where to write the markdown report
        #[arg(long, default_value = "compare.md")]
        report: PathBuf,
    },
    /// Write local changes to the store (dry run unless --execute)
    Apply {
        #[arg(long, default_value = "./local_changes")]
        changes_dir: PathBuf,
        /// Actually write to the store
        #[arg(long)]
        execute: bool,
    },
    /// Compare two configured environments
    Report {
        source_env: String,
        target_env: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

/// Runs a parsed command line.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = RunConfig::load(&cli.config)?;
    let sink: Arc<dyn ReportSink> = Arc::new(TracingSink);

    match cli.command {
        Command::Download { output_dir } => {
            let runner = SyncRunner::new(open_store(&config.project_id, &config.store)?, sink);
            runner.download(&config.kinds, &output_dir).await?;
        }
        Command::Compare {
            output_dir,
            against,
            skip_download,
            report,
        } => {
            let runner = SyncRunner::new(open_store(&config.project_id, &config.store)?, sink);
            if !skip_download {
                runner.download(&config.kinds, &output_dir).await?;
            }
            let comparison = runner.compare_directories(&config, &against, &output_dir)?;
            let markdown = render_markdown(
                &against.display().to_string(),
                &config.project_id,
                &comparison,
            );
            write_report(&report, &markdown)?;
        }
        Command::Apply {
            changes_dir,
            execute,
        } => {
            let mode = if execute {
                SyncMode::Apply
            } else {
                SyncMode::DryRun
            };
            let review_dir = changes_dir.join(docstore_sync::snapshot_dir::REVIEW_DIR_NAME);
            let runner = SyncRunner::new(open_store(&config.project_id, &config.store)?, sink);
            runner
                .sync_directory(&config, &changes_dir, mode, &review_dir)
                .await?;
            if mode == SyncMode::DryRun {
                info!("Dry run complete, review {}", review_dir.display());
            }
        }
        Command::Report {
            source_env,
            target_env,
            out,
        } => {
            let source = config.environment(&source_env)?;
            let target = config.environment(&target_env)?;
            let source_store = open_store(&source.project_id, &source.store)?;
            let target_store = open_store(&target.project_id, &target.store)?;

            let pairs: Vec<_> = source.kinds.into_iter().zip(target.kinds).collect();
            let comparison =
                compare_stores(source_store.as_ref(), target_store.as_ref(), &pairs, sink.as_ref())
                    .await?;
            write_report(&out, &render_markdown(&source_env, &target_env, &comparison))?;
        }
    }
    Ok(())
}

fn open_store(project_id: &str, settings: &StoreSettings) -> Result<Arc<dyn RemoteStore>> {
    let store = RestStore::new(settings.rest_config(project_id)?)?;
    Ok(Arc::new(store))
}

fn write_report(path: &Path, markdown: &str) -> Result<()> {
    std::fs::write(path, markdown)
        .with_context(|| format!("failed to write report {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}
