//! Compile command - turn a JSON analytics request into SQL
//!
//! # Usage
//!
//! ```bash
//! kb compile query.json
//! echo '{"type": "llm.completion", "groupBy": "day"}' | kb compile
//! ```
//!
//! Request fields: `type`/`types`, `timeRange`, `filters`, `groupBy`,
//! `breakdownBy`, `metrics`, `limit`.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use kb_analytics::{AnalyticsQuery, QueryCompiler};
use kb_config::Config;
use tracing::info;

/// Compile command arguments
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// JSON request file (`-` or omitted reads stdin)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

/// Run the compile command
pub fn run(args: CompileArgs, config: &Config) -> Result<()> {
    let json = read_input(args.input.as_ref())?;
    let sql = compile_json(&json, config)?;
    println!("{}", sql);
    Ok(())
}

fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request: {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read request from stdin")?;
            Ok(buf)
        }
    }
}

/// Parse a request and compile it with the configured table and defaults
pub fn compile_json(json: &str, config: &Config) -> Result<String> {
    let query: AnalyticsQuery =
        serde_json::from_str(json).context("failed to parse analytics request")?;

    let compiler = QueryCompiler::new(
        config.analytics.table.as_str(),
        config.analytics.metric_defaults(),
    );
    let sql = compiler
        .compile(&query)
        .context("failed to compile analytics request")?;

    info!(table = compiler.table(), "Compiled analytics request");
    Ok(sql)
}
