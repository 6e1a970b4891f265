//! Analytics query compilation
//!
//! An [`AnalyticsQuery`] is the declarative request (types, time range,
//! filters, grouping, breakdowns, metrics). [`QueryCompiler`] turns it into
//! a single SQL statement against the event table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::{Direction, SelectStatement, quote_ident};
use crate::error::Result;
use crate::filter::Condition;
use crate::granularity::{BUCKET_ALIAS, Granularity};
use crate::path::resolve_path;
use crate::schema::{EVENTS_TABLE, TIMESTAMP_COLUMN};
use crate::selector::{MetricDefaults, TypeFilter, build_metrics_select};
use crate::timerange::TimeRange;

/// Maximum allowed limit for query results
pub const MAX_LIMIT: u32 = 10_000;

/// Alias of the row count column
pub const COUNT_ALIAS: &str = "count";

/// A declarative analytics request
///
/// # Example
///
/// ```json
/// {
///   "types": ["llm.completion"],
///   "timeRange": "7d",
///   "filters": [{ "field": "payload.model", "operator": "eq", "value": "gpt-4" }],
///   "groupBy": "day",
///   "breakdownBy": ["actor.id"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalyticsQuery {
    /// Event type filter; also selects the default metrics
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub types: Option<TypeFilter>,
    /// Time range over `ts` (see [`TimeRange::parse`])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<String>,
    /// Additional conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Condition>,
    /// Granularity key for time bucketing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    /// Breakdown dimensions (dot-paths)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breakdown_by: Vec<String>,
    /// Explicit metrics; defaults by type prefix when absent or empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<String>>,
    /// Result limit (capped at `MAX_LIMIT`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl AnalyticsQuery {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to event types
    pub fn with_types(mut self, types: impl Into<TypeFilter>) -> Self {
        self.types = Some(types.into());
        self
    }

    /// Set the time range expression
    pub fn with_time_range(mut self, range: impl Into<String>) -> Self {
        self.time_range = Some(range.into());
        self
    }

    /// Add a condition
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.filters.push(condition);
        self
    }

    /// Set the granularity key
    pub fn with_group_by(mut self, granularity: impl Into<String>) -> Self {
        self.group_by = Some(granularity.into());
        self
    }

    /// Add a breakdown dimension
    pub fn with_breakdown(mut self, path: impl Into<String>) -> Self {
        self.breakdown_by.push(path.into());
        self
    }

    /// Set explicit metrics
    pub fn with_metrics<S: Into<String>>(mut self, metrics: impl IntoIterator<Item = S>) -> Self {
        self.metrics = Some(metrics.into_iter().map(Into::into).collect());
        self
    }

    /// Set result limit (capped at `MAX_LIMIT`)
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit.min(MAX_LIMIT));
        self
    }

    /// Metrics this query aggregates
    pub fn resolved_metrics(&self, defaults: &MetricDefaults) -> Vec<String> {
        match &self.metrics {
            Some(metrics) if !metrics.is_empty() => metrics.clone(),
            _ => defaults.for_types(self.types.as_ref()),
        }
    }
}

/// Compiles analytics queries against one event table
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    table: String,
    defaults: MetricDefaults,
}

impl Default for QueryCompiler {
    fn default() -> Self {
        Self::new(EVENTS_TABLE, MetricDefaults::default())
    }
}

impl QueryCompiler {
    /// Create a compiler for a table with a default-metric table
    pub fn new(table: impl Into<String>, defaults: MetricDefaults) -> Self {
        Self {
            table: table.into(),
            defaults,
        }
    }

    /// Table queried
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Default-metric table
    pub fn defaults(&self) -> &MetricDefaults {
        &self.defaults
    }

    /// Compile using the current time for relative ranges
    pub fn compile(&self, query: &AnalyticsQuery) -> Result<String> {
        self.compile_at(query, Utc::now())
    }

    /// Compile with relative ranges anchored at `now`
    pub fn compile_at(&self, query: &AnalyticsQuery, now: DateTime<Utc>) -> Result<String> {
        let mut stmt = SelectStatement::new(self.table.as_str());

        if let Some(key) = &query.group_by {
            let granularity = Granularity::parse(key)?;
            stmt = stmt.bucketed(granularity, TIMESTAMP_COLUMN, BUCKET_ALIAS);
        }

        for path in &query.breakdown_by {
            let expr = resolve_path(path)?;
            stmt = stmt.dimension(&expr, &quote_ident(path));
        }

        stmt = stmt.project_as("COUNT(*)", quote_ident(COUNT_ALIAS));

        let metrics = query.resolved_metrics(&self.defaults);
        for fragment in build_metrics_select(&metrics)? {
            stmt = stmt.project(fragment);
        }

        if let Some(clause) = type_clause(query.types.as_ref())? {
            stmt = stmt.filter(clause);
        }

        if let Some(range) = &query.time_range {
            let range = TimeRange::parse_at(range, now)?;
            stmt = stmt.filter(range.to_sql(TIMESTAMP_COLUMN));
        }

        for condition in &query.filters {
            stmt = stmt.filter(condition.to_sql()?);
        }

        if !stmt.is_ordered() && !query.breakdown_by.is_empty() {
            stmt = stmt.order(quote_ident(COUNT_ALIAS), Direction::Desc);
        }

        if let Some(limit) = query.limit {
            stmt = stmt.limit(limit.min(MAX_LIMIT));
        }

        let sql = stmt.build();
        debug!(table = %self.table, metrics = metrics.len(), sql = %sql, "compiled analytics query");
        Ok(sql)
    }
}

fn type_clause(types: Option<&TypeFilter>) -> Result<Option<String>> {
    let clause = match types {
        None => return Ok(None),
        Some(TypeFilter::Single(t)) => Condition::eq("type", t.as_str()),
        Some(TypeFilter::Multiple(ts)) if ts.is_empty() => return Ok(None),
        Some(TypeFilter::Multiple(ts)) => Condition::is_in("type", ts.clone()),
    };
    clause.to_sql().map(Some)
}
