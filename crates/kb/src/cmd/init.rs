//! Init command - create or upgrade the event store
//!
//! # Usage
//!
//! ```bash
//! kb init
//! kb init --db data/events.db
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use kb_config::Config;
use kb_store::EventStore;

/// Init command arguments
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Database path (overrides `[store] path`)
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

/// Run the init command
pub async fn run(args: InitArgs, config: &Config) -> Result<()> {
    let store = open_store(args.db, config).await?;

    for object in store
        .schema_objects()
        .await
        .context("failed to list schema objects")?
    {
        println!("{}\t{}", object.kind, object.name);
    }
    eprintln!("{} event(s) stored", store.count().await?);

    Ok(())
}

/// Open the store at `--db` or the configured path
pub async fn open_store(db: Option<PathBuf>, config: &Config) -> Result<EventStore> {
    let path = db.unwrap_or_else(|| config.store.path.clone());
    EventStore::open_with_table(&path, config.analytics.table.as_str())
        .await
        .with_context(|| format!("failed to open event store: {}", path.display()))
}
