//! kb Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Every section is optional; an empty file is a valid config.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use kb_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[analytics]\ntable = \"events\"").unwrap();
//! assert_eq!(config.analytics.table, "events");
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "debug"
//!
//! [analytics]
//! table = "events"
//!
//! [[analytics.metric_defaults]]
//! prefix = "llm."
//! metrics = ["totalTokens", "totalCost", "durationMs"]
//!
//! [store]
//! path = "data/events.db"
//! ```

mod analytics;
mod error;
mod logging;
mod store;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use analytics::{AnalyticsConfig, PrefixMetricsConfig};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use store::StoreConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Query compiler settings
    pub analytics: AnalyticsConfig,

    /// Event store settings
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.analytics.validate()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
