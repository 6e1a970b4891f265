//! Metric selection
//!
//! Default metric sets keyed by event-type prefix, and the aggregate
//! projections that sum a metric across a group.
//!
//! The prefix table is ordered. The first prefix matched by any of the
//! requested types wins; there is no longest-prefix preference.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::{JsonColumn, JsonPointer, json_extract};

/// Built-in prefix table, in match order
pub const DEFAULT_METRICS_BY_PREFIX: &[(&str, &[&str])] = &[
    (
        "llm.",
        &[
            "totalTokens",
            "totalCost",
            "durationMs",
            "inputTokens",
            "outputTokens",
        ],
    ),
    (
        "embeddings.",
        &["totalTokens", "totalCost", "durationMs", "inputCount"],
    ),
    (
        "vectorstore.",
        &["durationMs", "resultCount", "totalCost"],
    ),
    ("cache.", &["hits", "misses", "durationMs"]),
    ("storage.", &["bytesRead", "bytesWritten", "durationMs"]),
];

/// Metrics used when no type filter is given or no prefix matches
pub const FALLBACK_METRICS: &[&str] = &["totalCost", "totalTokens", "durationMs"];

/// Event type filter: one type or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeFilter {
    /// Single event type
    Single(String),
    /// Any of several event types
    Multiple(Vec<String>),
}

impl TypeFilter {
    /// Types in caller order
    pub fn types(&self) -> Vec<&str> {
        match self {
            Self::Single(t) => vec![t.as_str()],
            Self::Multiple(ts) => ts.iter().map(String::as_str).collect(),
        }
    }

    /// Whether the filter names no type at all
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(_) => false,
            Self::Multiple(ts) => ts.is_empty(),
        }
    }
}

impl From<&str> for TypeFilter {
    fn from(t: &str) -> Self {
        Self::Single(t.to_string())
    }
}

impl From<Vec<String>> for TypeFilter {
    fn from(ts: Vec<String>) -> Self {
        Self::Multiple(ts)
    }
}

/// One row of the prefix table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMetrics {
    /// Event type prefix, e.g. `llm.`
    pub prefix: String,
    /// Metric names, in output order
    pub metrics: Vec<String>,
}

/// Immutable default-metric lookup table
///
/// Built once (from the built-in table or from configuration) and passed
/// by reference to whatever compiles queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefaults {
    by_prefix: Vec<PrefixMetrics>,
    fallback: Vec<String>,
}

impl MetricDefaults {
    /// Create a lookup table from ordered prefix rows and a fallback set
    pub fn new(by_prefix: Vec<PrefixMetrics>, fallback: Vec<String>) -> Self {
        Self {
            by_prefix,
            fallback,
        }
    }

    /// Prefix rows, in match order
    pub fn prefixes(&self) -> &[PrefixMetrics] {
        &self.by_prefix
    }

    /// Fallback metric set
    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }

    /// Default metrics for a type filter
    pub fn for_types(&self, filter: Option<&TypeFilter>) -> Vec<String> {
        let Some(filter) = filter else {
            return self.fallback.clone();
        };
        let types = filter.types();

        self.by_prefix
            .iter()
            .find(|row| types.iter().any(|t| t.starts_with(row.prefix.as_str())))
            .map(|row| row.metrics.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for MetricDefaults {
    fn default() -> Self {
        let by_prefix = DEFAULT_METRICS_BY_PREFIX
            .iter()
            .map(|(prefix, metrics)| PrefixMetrics {
                prefix: (*prefix).to_string(),
                metrics: to_strings(metrics),
            })
            .collect();
        Self::new(by_prefix, to_strings(FALLBACK_METRICS))
    }
}

/// Default metrics using the built-in table
pub fn default_metrics(filter: Option<&TypeFilter>) -> Vec<String> {
    MetricDefaults::default().for_types(filter)
}

/// Aggregate projection for one metric
///
/// `SUM(TRY_CAST(json_extract_string(payload, '$.<name>') AS DOUBLE)) AS "<name>"`.
/// A value that does not cast contributes NULL, which `SUM` skips. Dots in
/// the name address nested payload fields.
pub fn metric_select(name: &str) -> Result<String> {
    let pointer = JsonPointer::new(name, name.split('.'))?;
    Ok(format!(
        "SUM(TRY_CAST({} AS DOUBLE)) AS \"{}\"",
        json_extract(JsonColumn::Payload.as_str(), &pointer),
        name
    ))
}

/// Aggregate projections, one per name and in input order
///
/// Duplicates are passed through; uniqueness is the caller's concern.
pub fn build_metrics_select<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>> {
    names.iter().map(|n| metric_select(n.as_ref())).collect()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
