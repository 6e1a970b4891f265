//! kb - analytics query compiler and event store
//!
//! # Usage
//!
//! ```bash
//! # Resolve field paths
//! kb resolve payload.model actor.id
//!
//! # Default metrics for a type
//! kb metrics --type llm.completion
//!
//! # Compile a JSON request to SQL
//! kb compile query.json
//! echo '{"groupBy": "day"}' | kb compile
//!
//! # Event store
//! kb schema
//! kb init --db data/events.db
//! kb ingest events.jsonl
//! ```

mod cmd;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kb_config::{Config, LogFormat, LogLevel};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// kb - analytics query compiler and event store
#[derive(Parser, Debug)]
#[command(name = "kb")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve dot-paths to SQL expressions
    Resolve(cmd::resolve::ResolveArgs),

    /// Show default metrics for event types
    Metrics(cmd::metrics::MetricsArgs),

    /// Compile a JSON analytics request to SQL
    Compile(cmd::compile::CompileArgs),

    /// Print the event table DDL
    Schema,

    /// Create or upgrade the event store
    Init(cmd::init::InitArgs),

    /// Append JSON-lines events to the store
    Ingest(cmd::ingest::IngestArgs),
}

/// Config file locations tried when `--config` is not given
const DEFAULT_CONFIG_PATHS: &[&str] = &["kb.toml", "configs/kb.toml"];

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let level = cli.log_level.unwrap_or(config.log.level);
    init_logging(&config.log.filter_directives(level), config.log.format)?;

    match cli.command {
        Command::Resolve(args) => cmd::resolve::run(args),
        Command::Metrics(args) => cmd::metrics::run(args, &config),
        Command::Compile(args) => cmd::compile::run(args, &config),
        Command::Schema => cmd::schema::run(&config),
        Command::Init(args) => cmd::init::run(args, &config).await,
        Command::Ingest(args) => cmd::ingest::run(args, &config).await,
    }
}

/// Load config: explicit path > default paths > built-in defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Config::from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()));
    }

    for candidate in DEFAULT_CONFIG_PATHS {
        let candidate = Path::new(candidate);
        if candidate.exists() {
            return Config::from_file(candidate)
                .with_context(|| format!("failed to load config: {}", candidate.display()));
        }
    }

    Ok(Config::default())
}

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr so stdout carries only command output.
fn init_logging(directives: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(directives)
        .with_context(|| format!("invalid log directives: {}", directives))?;

    let (console, json) = match format {
        LogFormat::Console => (
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(fmt::layer().json().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(json)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    Ok(())
}
