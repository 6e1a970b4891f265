//! `[log]` section
//!
//! The `kb` binary builds its `tracing` filter from `level` plus any
//! per-target `directives`, e.g. `kb_analytics=debug` to see compiled SQL
//! without debug output from the store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

/// Accepted spellings, first entry is canonical
const LEVEL_NAMES: &[(LogLevel, &[&str])] = &[
    (LogLevel::Trace, &["trace"]),
    (LogLevel::Debug, &["debug"]),
    (LogLevel::Info, &["info"]),
    (LogLevel::Warn, &["warn", "warning"]),
    (LogLevel::Error, &["error"]),
];

/// Minimum severity emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_str(&self) -> &'static str {
        LEVEL_NAMES
            .iter()
            .find(|(level, _)| level == self)
            .map(|(_, names)| names[0])
            .unwrap_or("info")
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        LEVEL_NAMES
            .iter()
            .find(|(_, names)| names.contains(&lowered.as_str()))
            .map(|(level, _)| *level)
            .ok_or_else(|| format!("unknown log level: {}", s))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Log line format on stderr
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Console,
    /// One JSON object per line
    Json,
}

/// Logging configuration
///
/// ```toml
/// [log]
/// level = "info"
/// format = "json"
/// directives = ["kb_analytics=debug"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Default: info
    pub level: LogLevel,

    /// Default: console
    pub format: LogFormat,

    /// Extra `target=level` filter directives, applied after `level`
    pub directives: Vec<String>,
}

impl LogConfig {
    /// Full filter string for `level`, which may come from the command line
    pub fn filter_directives(&self, level: LogLevel) -> String {
        std::iter::once(level.as_str())
            .chain(self.directives.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(",")
    }
}
