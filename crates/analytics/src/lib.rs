//! kb Analytics Compiler
//!
//! Turns declarative analytics requests into SQL over the `kb.v1` event
//! table, where semi-structured fields live in the `ctx` and `payload` JSON
//! documents.
//!
//! # Overview
//!
//! - **Schema**: column layout and idempotent DDL of the `events` table
//! - **Paths**: dot-path to column or JSON-extraction expression
//! - **Selector**: default metric sets by event-type prefix, SUM projections
//! - **Granularity**: time bucket truncation units and label formats
//! - **Query**: request model and the compiler that assembles the statement
//!
//! Everything here is pure: no I/O, no shared mutable state, and identical
//! input always yields byte-identical SQL.
//!
//! # Usage
//!
//! ```
//! use kb_analytics::{AnalyticsQuery, QueryCompiler, resolve_path};
//!
//! assert_eq!(resolve_path("actor.id").unwrap(), "actor_id");
//!
//! let query = AnalyticsQuery::new()
//!     .with_types("llm.completion")
//!     .with_group_by("day")
//!     .with_breakdown("payload.model");
//! let sql = QueryCompiler::default().compile(&query).unwrap();
//! assert!(sql.contains("GROUP BY bucket"));
//! ```

pub mod builder;
pub mod error;
pub mod event;
pub mod filter;
pub mod granularity;
pub mod path;
pub mod query;
pub mod schema;
pub mod selector;
pub mod timerange;

#[cfg(test)]
mod builder_test;
#[cfg(test)]
mod query_test;

// Re-exports for convenience
pub use builder::{Direction, SelectStatement};
pub use error::{AnalyticsError, Result};
pub use event::{Actor, Event, Source};
pub use filter::{Condition, ConditionValue, Operator};
pub use granularity::{Granularity, display_format, trunc_unit};
pub use path::{FieldRef, JsonColumn, JsonPointer, resolve_path};
pub use query::{AnalyticsQuery, MAX_LIMIT, QueryCompiler};
pub use schema::{EVENTS_TABLE, SCHEMA_VERSION, ddl_statements};
pub use selector::{
    MetricDefaults, PrefixMetrics, TypeFilter, build_metrics_select, default_metrics,
};
pub use timerange::TimeRange;
