//! Metrics command - show default metrics and their projections
//!
//! # Usage
//!
//! ```bash
//! kb metrics
//! kb metrics --type llm.completion
//! kb metrics --type embeddings.create --type llm.completion --select
//! ```

use anyhow::Result;
use clap::Args;
use kb_analytics::{MetricDefaults, TypeFilter, build_metrics_select};
use kb_config::Config;

/// Metrics command arguments
#[derive(Args, Debug)]
pub struct MetricsArgs {
    /// Event type (can be repeated)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    types: Vec<String>,

    /// Print the SUM projection instead of the metric name
    #[arg(long)]
    select: bool,
}

/// Run the metrics command
pub fn run(args: MetricsArgs, config: &Config) -> Result<()> {
    let defaults = config.analytics.metric_defaults();
    for line in metric_lines(&args, &defaults)? {
        println!("{}", line);
    }
    Ok(())
}

fn metric_lines(args: &MetricsArgs, defaults: &MetricDefaults) -> Result<Vec<String>> {
    let filter = (!args.types.is_empty()).then(|| TypeFilter::Multiple(args.types.clone()));
    let names = defaults.for_types(filter.as_ref());

    if args.select {
        Ok(build_metrics_select(&names)?)
    } else {
        Ok(names)
    }
}
