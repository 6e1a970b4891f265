//! Resolve command - show the SQL expression for dot-paths
//!
//! # Usage
//!
//! ```bash
//! kb resolve actor.id
//! kb resolve payload.model ctx.sessionId custom.field
//! ```

use anyhow::{Context, Result};
use clap::Args;
use kb_analytics::FieldRef;

/// Resolve command arguments
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Dot-paths to resolve
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<String>,
}

/// Run the resolve command
pub fn run(args: ResolveArgs) -> Result<()> {
    for line in resolve_lines(&args.paths)? {
        println!("{}", line);
    }
    Ok(())
}

/// One `<path>\t<expression>` line per path
fn resolve_lines(paths: &[String]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|path| {
            let field =
                FieldRef::parse(path).with_context(|| format!("cannot resolve '{}'", path))?;
            Ok(format!("{}\t{}", path, field.to_sql()))
        })
        .collect()
}
