//! Field path resolution
//!
//! Maps a dot-path such as `payload.totalTokens` or `actor.id` to the SQL
//! expression that reads it from an event row. Resolution order:
//!
//! 1. Direct column (or alias) on the root segment: `product`, `runId`
//! 2. `actor.<type|id|name>` to the flattened `actor_*` columns
//! 3. `source.<product|version>` to the flattened source columns
//! 4. `payload.*` / `ctx.*` to a JSON extraction on that document
//! 5. Anything else to a JSON extraction of the whole path on `payload`
//!
//! Every segment is checked against a conservative alphabet before it is
//! embedded in a JSON pointer, so caller input can never close the
//! surrounding SQL string literal.

use std::fmt;

use tracing::debug;

use crate::error::{AnalyticsError, Result};

/// Root-level columns, and aliases, readable without JSON extraction
const DIRECT_COLUMNS: &[(&str, &str)] = &[
    ("product", "product"),
    ("version", "version"),
    ("type", "type"),
    ("run_id", "run_id"),
    ("runId", "run_id"),
];

/// `actor.<field>` to flattened column
const ACTOR_FIELDS: &[(&str, &str)] = &[
    ("type", "actor_type"),
    ("id", "actor_id"),
    ("name", "actor_name"),
];

/// `source.<field>` to flattened column
const SOURCE_FIELDS: &[(&str, &str)] = &[("product", "product"), ("version", "version")];

/// Embedded JSON document columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonColumn {
    /// Event payload
    Payload,
    /// Event context
    Ctx,
}

impl JsonColumn {
    /// Physical column name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payload => "payload",
            Self::Ctx => "ctx",
        }
    }

    fn from_root(root: &str) -> Option<Self> {
        match root {
            "payload" => Some(Self::Payload),
            "ctx" => Some(Self::Ctx),
            _ => None,
        }
    }
}

/// A JSON pointer built from validated segments (`$.a.b`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPointer {
    segments: Vec<String>,
}

impl JsonPointer {
    /// Build a pointer, rejecting any unsafe segment
    pub fn new<'a>(path: &str, segments: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let segments = segments
            .into_iter()
            .map(|s| validate_segment(path, s).map(str::to_string))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    /// Pointer segments after the `$` root
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

/// A resolved field reference
///
/// Closed set of resolution outcomes; `to_sql` is the only place SQL text
/// is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    /// Root-level column (after alias mapping)
    DirectColumn(&'static str),
    /// Flattened actor column
    ActorField(&'static str),
    /// Flattened source column
    SourceField(&'static str),
    /// Nested field inside `payload` or `ctx`
    JsonColumn {
        column: JsonColumn,
        pointer: JsonPointer,
    },
    /// Unrecognized root, read from `payload` using the full path
    Fallback { pointer: JsonPointer },
}

impl FieldRef {
    /// Resolve a dot-path
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<&str> = path.split('.').collect();
        for segment in &segments {
            validate_segment(path, segment)?;
        }

        let root = segments[0];
        let child = segments.get(1).copied();

        if let Some(column) = lookup(DIRECT_COLUMNS, root) {
            return Ok(Self::DirectColumn(column));
        }

        match (root, child) {
            ("actor", Some(child)) => {
                if let Some(column) = lookup(ACTOR_FIELDS, child) {
                    return Ok(Self::ActorField(column));
                }
            }
            ("source", Some(child)) => {
                if let Some(column) = lookup(SOURCE_FIELDS, child) {
                    return Ok(Self::SourceField(column));
                }
            }
            _ => {}
        }

        if let Some(column) = JsonColumn::from_root(root) {
            let pointer = JsonPointer::new(path, segments[1..].iter().copied())?;
            return Ok(Self::JsonColumn { column, pointer });
        }

        debug!(path, root, "unrecognized path root, reading from payload");
        let pointer = JsonPointer::new(path, segments.iter().copied())?;
        Ok(Self::Fallback { pointer })
    }

    /// Whether this reference reads a physical column directly
    pub fn is_column(&self) -> bool {
        matches!(
            self,
            Self::DirectColumn(_) | Self::ActorField(_) | Self::SourceField(_)
        )
    }

    /// SQL expression reading this field
    pub fn to_sql(&self) -> String {
        match self {
            Self::DirectColumn(column) | Self::ActorField(column) | Self::SourceField(column) => {
                (*column).to_string()
            }
            Self::JsonColumn { column, pointer } => json_extract(column.as_str(), pointer),
            Self::Fallback { pointer } => json_extract(JsonColumn::Payload.as_str(), pointer),
        }
    }
}

/// Resolve a dot-path to its SQL expression
///
/// Fails only with [`AnalyticsError::UnsafePathSegment`].
pub fn resolve_path(path: &str) -> Result<String> {
    FieldRef::parse(path).map(|field| field.to_sql())
}

/// `json_extract_string(<column>, '<pointer>')`
pub(crate) fn json_extract(column: &str, pointer: &JsonPointer) -> String {
    format!("json_extract_string({}, '{}')", column, pointer)
}

/// Check whether a segment can be embedded in a JSON pointer and SQL literal
///
/// Allowed: Unicode letters and digits, `_` and `-`. Quotes, whitespace,
/// and JSONPath syntax (`.`, `[`, `$`, `*`) never pass. Empty segments are
/// rejected.
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

pub(crate) fn validate_segment<'a>(path: &str, segment: &'a str) -> Result<&'a str> {
    if is_safe_segment(segment) {
        Ok(segment)
    } else {
        Err(AnalyticsError::unsafe_segment(path, segment))
    }
}

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, column)| *column)
}
