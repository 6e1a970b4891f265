//! Time range parsing
//!
//! Accepts relative windows (`24h`, `7d`, `2w`), `today` / `yesterday`, and
//! explicit `start,end` ranges of dates or RFC 3339 timestamps.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::{AnalyticsError, Result};

/// A time range over the event timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    /// Start of the range (inclusive)
    pub start: DateTime<Utc>,
    /// End of the range (inclusive)
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a new time range
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(AnalyticsError::InvalidTimeRange(
                "end must be after start".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse relative to the current time
    pub fn parse(s: &str) -> Result<Self> {
        Self::parse_at(s, Utc::now())
    }

    /// Parse relative to a fixed instant
    ///
    /// Relative hour windows end at `now`; day and week windows cover whole
    /// days, today included.
    pub fn parse_at(s: &str, now: DateTime<Utc>) -> Result<Self> {
        let s = s.trim();

        if let Some((start, end)) = s.split_once(',') {
            let start = parse_bound(start.trim(), false)?;
            let end = parse_bound(end.trim(), true)?;
            return Self::new(start, end);
        }

        let today = now.date_naive();
        match s.to_lowercase().as_str() {
            "today" => return Self::new(day_start(today)?, day_end(today)?),
            "yesterday" => {
                let day = today.pred_opt().ok_or_else(|| out_of_range(s))?;
                return Self::new(day_start(day)?, day_end(day)?);
            }
            _ => {}
        }

        let (num, unit) = split_num_unit(s).ok_or_else(|| {
            AnalyticsError::InvalidTimeRange(format!("unknown time range format: {}", s))
        })?;

        let window = match unit {
            'h' => Duration::try_hours(num),
            'd' => Duration::try_days(num - 1),
            'w' => num
                .checked_mul(7)
                .and_then(|days| Duration::try_days(days - 1)),
            _ => {
                return Err(AnalyticsError::InvalidTimeRange(format!(
                    "unknown time unit '{}' in {}",
                    unit, s
                )));
            }
        };
        let window = window.ok_or_else(|| out_of_range(s))?;

        if unit == 'h' {
            let start = now
                .checked_sub_signed(window)
                .ok_or_else(|| out_of_range(s))?;
            return Self::new(start, now);
        }
        let first_day = today
            .checked_sub_signed(window)
            .ok_or_else(|| out_of_range(s))?;
        Self::new(day_start(first_day)?, day_end(today)?)
    }

    /// Get the duration of this range
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// `<col> >= '<start>' AND <col> <= '<end>'`
    pub fn to_sql(&self, timestamp_col: &str) -> String {
        format!(
            "{} >= '{}' AND {} <= '{}'",
            timestamp_col,
            sql_timestamp(self.start),
            timestamp_col,
            sql_timestamp(self.end)
        )
    }
}

/// Timestamp literal with explicit UTC offset
pub fn sql_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

fn parse_bound(s: &str, is_end: bool) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        AnalyticsError::InvalidTimeRange(format!(
            "invalid date: {} (use YYYY-MM-DD or RFC 3339)",
            s
        ))
    })?;
    if is_end { day_end(date) } else { day_start(date) }
}

fn split_num_unit(s: &str) -> Option<(i64, char)> {
    let unit = s.chars().last()?;
    if !unit.is_ascii_alphabetic() {
        return None;
    }
    let num: i64 = s[..s.len() - 1].parse().ok()?;
    (num > 0).then_some((num, unit.to_ascii_lowercase()))
}

fn out_of_range(s: &str) -> AnalyticsError {
    AnalyticsError::InvalidTimeRange(format!("out of range: {}", s))
}

fn day_start(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|ts| ts.and_utc())
        .ok_or_else(|| out_of_range(&date.to_string()))
}

/// Last whole second of `date`, built directly so the calendar edge never
/// needs date arithmetic
fn day_end(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_opt(23, 59, 59)
        .map(|ts| ts.and_utc())
        .ok_or_else(|| out_of_range(&date.to_string()))
}
