//! Time bucketing
//!
//! Each granularity maps to exactly one truncation unit and one label format.
//! The week label uses the formatter's `WW` week number, which counts from
//! January 1st and does not follow ISO-8601 weeks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Alias used for the bucket label column
pub const BUCKET_ALIAS: &str = "bucket";

/// Time granularity for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Per hour
    Hour,
    /// Per day
    Day,
    /// Per week
    Week,
    /// Per month
    Month,
}

impl Granularity {
    /// All granularities, finest first
    pub const ALL: [Granularity; 4] = [Self::Hour, Self::Day, Self::Week, Self::Month];

    /// Parse a granularity key
    ///
    /// Only the four exact keys are accepted.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(AnalyticsError::InvalidGranularity(s.to_string())),
        }
    }

    /// Key as accepted by `parse`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Unit passed to `date_trunc`
    pub fn trunc_unit(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Format string for the bucket label
    pub fn display_format(&self) -> &'static str {
        match self {
            Self::Hour => "YYYY-MM-DDTHH",
            Self::Day => "YYYY-MM-DD",
            Self::Week => "YYYY-\"W\"WW",
            Self::Month => "YYYY-MM",
        }
    }

    /// `date_trunc('<unit>', <column>)`
    pub fn trunc_expr(&self, timestamp_col: &str) -> String {
        format!("date_trunc('{}', {})", self.trunc_unit(), timestamp_col)
    }

    /// `to_char(date_trunc('<unit>', <column>), '<format>')`
    pub fn label_expr(&self, timestamp_col: &str) -> String {
        format!(
            "to_char({}, '{}')",
            self.trunc_expr(timestamp_col),
            self.display_format()
        )
    }
}

impl FromStr for Granularity {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Truncation unit for a granularity key
pub fn trunc_unit(granularity: &str) -> Result<&'static str> {
    Granularity::parse(granularity).map(|g| g.trunc_unit())
}

/// Display format for a granularity key
pub fn display_format(granularity: &str) -> Result<&'static str> {
    Granularity::parse(granularity).map(|g| g.display_format())
}
