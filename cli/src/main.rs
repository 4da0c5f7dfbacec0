//! docstore: keep document store configuration in files.
//!
//! Usage:
//!   docstore download --output-dir ./output
//!   docstore compare --against ./local_changes
//!   docstore apply --changes-dir ./local_changes [--execute]
//!   docstore report dev prod
//!
//! Nothing is ever deleted from the store.

use anyhow::Result;
use clap::Parser;
use docstore_cli::{execute, Cli};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    execute(cli).await
}
