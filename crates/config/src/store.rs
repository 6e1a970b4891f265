//! Event store configuration

use std::path::PathBuf;

use serde::Deserialize;

/// Event store configuration
///
/// # Example
///
/// ```toml
/// [store]
/// path = "data/events.db"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file, or `:memory:`
    /// Default: data/events.db
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/events.db"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path() {
        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config.path, PathBuf::from("data/events.db"));
    }

    #[test]
    fn test_memory_path() {
        let config: StoreConfig = toml::from_str(r#"path = ":memory:""#).unwrap();
        assert_eq!(config.path, PathBuf::from(":memory:"));
    }
}
