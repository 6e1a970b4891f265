//! Analytics compiler configuration
//!
//! Event table name and the default-metric table. The prefix table is an
//! array of tables so its order, which decides ties, survives parsing.

use kb_analytics::path::is_safe_segment;
use kb_analytics::selector::FALLBACK_METRICS;
use kb_analytics::{EVENTS_TABLE, MetricDefaults, PrefixMetrics};
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// One `[[analytics.metric_defaults]]` entry
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PrefixMetricsConfig {
    /// Event type prefix, e.g. `llm.`
    pub prefix: String,
    /// Metric names, in output order
    pub metrics: Vec<String>,
}

/// Analytics configuration
///
/// # Example
///
/// ```toml
/// [analytics]
/// table = "events"
/// fallback_metrics = ["totalCost", "totalTokens", "durationMs"]
///
/// [[analytics.metric_defaults]]
/// prefix = "llm."
/// metrics = ["totalTokens", "totalCost"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Event table name
    /// Default: events
    pub table: String,

    /// Metrics when no prefix matches
    /// Default: totalCost, totalTokens, durationMs
    pub fallback_metrics: Vec<String>,

    /// Ordered prefix table; the built-in table when absent
    pub metric_defaults: Option<Vec<PrefixMetricsConfig>>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            table: EVENTS_TABLE.to_string(),
            fallback_metrics: FALLBACK_METRICS.iter().map(|s| s.to_string()).collect(),
            metric_defaults: None,
        }
    }
}

impl AnalyticsConfig {
    /// Build the immutable lookup table handed to the compiler
    pub fn metric_defaults(&self) -> MetricDefaults {
        let by_prefix = match &self.metric_defaults {
            Some(rows) => rows
                .iter()
                .map(|row| PrefixMetrics {
                    prefix: row.prefix.clone(),
                    metrics: row.metrics.clone(),
                })
                .collect(),
            None => MetricDefaults::default().prefixes().to_vec(),
        };
        MetricDefaults::new(by_prefix, self.fallback_metrics.clone())
    }

    /// Validate the section
    pub(crate) fn validate(&self) -> Result<()> {
        if !is_identifier(&self.table) {
            return Err(ConfigError::invalid_value(
                "analytics",
                "table",
                format!("'{}' is not a plain identifier", self.table),
            ));
        }

        if self.fallback_metrics.is_empty() {
            return Err(ConfigError::invalid_value(
                "analytics",
                "fallback_metrics",
                "must list at least one metric",
            ));
        }
        validate_metric_names("fallback_metrics", &self.fallback_metrics)?;

        let Some(rows) = &self.metric_defaults else {
            return Ok(());
        };

        let mut seen: Vec<&str> = Vec::with_capacity(rows.len());
        for row in rows {
            if row.prefix.is_empty() {
                return Err(ConfigError::invalid_value(
                    "analytics",
                    "metric_defaults.prefix",
                    "must not be empty",
                ));
            }
            if seen.contains(&row.prefix.as_str()) {
                return Err(ConfigError::duplicate_prefix(&row.prefix));
            }
            seen.push(&row.prefix);

            if row.metrics.is_empty() {
                return Err(ConfigError::invalid_value(
                    "analytics",
                    "metric_defaults.metrics",
                    format!("prefix '{}' lists no metrics", row.prefix),
                ));
            }
            validate_metric_names("metric_defaults.metrics", &row.metrics)?;
        }

        Ok(())
    }
}

fn validate_metric_names(field: &'static str, names: &[String]) -> Result<()> {
    for name in names {
        if !name.split('.').all(is_safe_segment) {
            return Err(ConfigError::invalid_value(
                "analytics",
                field,
                format!("unsafe metric name '{}'", name),
            ));
        }
    }
    Ok(())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use kb_analytics::TypeFilter;

    use super::*;

    #[test]
    fn test_default_matches_builtin_table() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.table, "events");
        assert_eq!(config.metric_defaults(), MetricDefaults::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fallback_override_keeps_builtin_prefixes() {
        let config: AnalyticsConfig = toml::from_str(r#"fallback_metrics = ["latencyMs"]"#).unwrap();
        let defaults = config.metric_defaults();

        assert_eq!(defaults.prefixes(), MetricDefaults::default().prefixes());
        assert_eq!(defaults.fallback(), ["latencyMs".to_string()]);
    }

    #[test]
    fn test_custom_table_keeps_order() {
        let toml = r#"
[[metric_defaults]]
prefix = "job."
metrics = ["rows", "durationMs"]

[[metric_defaults]]
prefix = "llm."
metrics = ["totalTokens"]
"#;
        let config: AnalyticsConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        let defaults = config.metric_defaults();
        let prefixes: Vec<&str> = defaults
            .prefixes()
            .iter()
            .map(|p| p.prefix.as_str())
            .collect();
        assert_eq!(prefixes, vec!["job.", "llm."]);

        let filter = TypeFilter::Multiple(vec!["llm.chat".into(), "job.run".into()]);
        assert_eq!(defaults.for_types(Some(&filter)), vec!["rows", "durationMs"]);
    }

    #[test]
    fn test_rejects_duplicate_prefix() {
        let toml = r#"
[[metric_defaults]]
prefix = "llm."
metrics = ["a"]

[[metric_defaults]]
prefix = "llm."
metrics = ["b"]
"#;
        let config: AnalyticsConfig = toml::from_str(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicatePrefix { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_lists() {
        let config: AnalyticsConfig = toml::from_str("fallback_metrics = []").unwrap();
        assert!(config.validate().is_err());

        let toml = r#"
[[metric_defaults]]
prefix = "llm."
metrics = []
"#;
        let config: AnalyticsConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unsafe_names() {
        let config: AnalyticsConfig =
            toml::from_str(r#"fallback_metrics = ["cost\"; --"]"#).unwrap();
        assert!(config.validate().is_err());

        let config: AnalyticsConfig = toml::from_str(r#"table = "events; DROP""#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("events"));
        assert!(is_identifier("_kb_events2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2events"));
        assert!(!is_identifier("public.events"));
    }
}
