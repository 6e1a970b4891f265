//! Analytics error types

use thiserror::Error;

/// Analytics errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyticsError {
    /// Granularity key outside hour/day/week/month
    #[error("invalid granularity: {0}")]
    InvalidGranularity(String),

    /// Path segment that cannot be embedded in a JSON pointer or SQL literal
    #[error("unsafe path segment {segment:?} in {path:?}")]
    UnsafePathSegment { path: String, segment: String },

    /// Invalid filter syntax
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Invalid time range
    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),

    /// Invalid operator
    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(String),
}

impl AnalyticsError {
    /// Create an unsafe path segment error
    pub fn unsafe_segment(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::UnsafePathSegment {
            path: path.into(),
            segment: segment.into(),
        }
    }
}

/// Result type for analytics operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;
