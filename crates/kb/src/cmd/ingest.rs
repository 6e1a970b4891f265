//! Ingest command - append JSON-lines events to the store
//!
//! # Usage
//!
//! ```bash
//! kb ingest events.jsonl
//! cat events.jsonl | kb ingest --db data/events.db
//! ```
//!
//! One event per line; blank lines are skipped. Ingestion stops at the
//! first invalid or duplicate event; earlier lines stay stored.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use kb_analytics::Event;
use kb_config::Config;
use kb_store::EventStore;
use tracing::info;

use crate::cmd::init::open_store;

/// Ingest command arguments
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// JSON-lines file (`-` or omitted reads stdin)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Database path (overrides `[store] path`)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
}

/// Run the ingest command
pub async fn run(args: IngestArgs, config: &Config) -> Result<()> {
    let content = match &args.input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read events: {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read events from stdin")?;
            buf
        }
    };

    let store = open_store(args.db, config).await?;
    let appended = ingest_lines(&store, &content).await?;

    info!(count = appended, "Ingested events");
    println!("{} event(s) appended", appended);
    Ok(())
}

/// Parse and append line by line, returning the number appended
///
/// Lines before a failing one are already stored when the error returns.
async fn ingest_lines(store: &EventStore, content: &str) -> Result<usize> {
    let mut appended = 0;
    for (i, line) in content.lines().enumerate() {
        let Some(event) = parse_line(i + 1, line)? else {
            continue;
        };
        store
            .append(&event)
            .await
            .with_context(|| format!("line {}: failed to append event {}", i + 1, event.id))?;
        appended += 1;
    }
    Ok(appended)
}

/// Parse one 1-based line; blank lines yield `None`
fn parse_line(line_no: usize, line: &str) -> Result<Option<Event>> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let event = serde_json::from_str(line)
        .with_context(|| format!("line {}: invalid event", line_no))?;
    Ok(Some(event))
}
