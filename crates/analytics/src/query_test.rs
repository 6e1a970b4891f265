//! Tests for analytics query compilation

use chrono::{DateTime, TimeZone, Utc};

use crate::error::AnalyticsError;
use crate::filter::Condition;
use crate::query::{AnalyticsQuery, MAX_LIMIT, QueryCompiler};
use crate::selector::{MetricDefaults, PrefixMetrics, TypeFilter};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

fn compile(query: &AnalyticsQuery) -> String {
    QueryCompiler::default().compile_at(query, now()).unwrap()
}

#[test]
fn test_empty_query_uses_fallback_metrics() {
    let sql = compile(&AnalyticsQuery::new());

    assert!(sql.starts_with("SELECT COUNT(*) AS \"count\", "));
    assert!(sql.contains("AS \"totalCost\""));
    assert!(sql.contains("AS \"totalTokens\""));
    assert!(sql.contains("AS \"durationMs\""));
    assert!(sql.ends_with("FROM events"));
}

#[test]
fn test_full_query() {
    let query = AnalyticsQuery::new()
        .with_types("llm.completion")
        .with_time_range("2024-01-01,2024-01-31")
        .with_condition(Condition::eq("payload.model", "gpt-4"))
        .with_group_by("day")
        .with_breakdown("actor.id")
        .with_metrics(["totalCost"]);

    assert_eq!(
        compile(&query),
        "SELECT to_char(date_trunc('day', ts), 'YYYY-MM-DD') AS bucket, \
         actor_id AS \"actor.id\", \
         COUNT(*) AS \"count\", \
         SUM(TRY_CAST(json_extract_string(payload, '$.totalCost') AS DOUBLE)) AS \"totalCost\" \
         FROM events \
         WHERE type = 'llm.completion' \
         AND ts >= '2024-01-01 00:00:00+00:00' AND ts <= '2024-01-31 23:59:59+00:00' \
         AND json_extract_string(payload, '$.model') = 'gpt-4' \
         GROUP BY bucket, actor_id \
         ORDER BY bucket"
    );
}

#[test]
fn test_default_metrics_follow_types() {
    let query = AnalyticsQuery::new().with_types(vec![
        "embeddings.create".to_string(),
        "llm.completion".to_string(),
    ]);
    let sql = compile(&query);

    assert!(sql.contains("type IN ('embeddings.create', 'llm.completion')"));
    assert!(sql.contains("AS \"inputTokens\""));
    assert!(sql.contains("AS \"outputTokens\""));
    assert!(!sql.contains("inputCount"));
}

#[test]
fn test_metric_columns_keep_order() {
    let sql = compile(&AnalyticsQuery::new().with_types("llm.completion"));
    let positions: Vec<usize> = [
        "\"totalTokens\"",
        "\"totalCost\"",
        "\"durationMs\"",
        "\"inputTokens\"",
        "\"outputTokens\"",
    ]
    .iter()
    .map(|alias| sql.find(alias).unwrap())
    .collect();

    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_empty_metric_list_uses_defaults() {
    let query = AnalyticsQuery::new().with_metrics(Vec::<String>::new());
    assert!(compile(&query).contains("\"totalCost\""));
}

#[test]
fn test_breakdown_without_bucket_orders_by_count() {
    let query = AnalyticsQuery::new()
        .with_breakdown("payload.model")
        .with_breakdown("product");
    let sql = compile(&query);

    assert!(sql.contains("json_extract_string(payload, '$.model') AS \"payload.model\""));
    assert!(sql.contains("product AS \"product\""));
    assert!(sql.contains("GROUP BY json_extract_string(payload, '$.model'), product"));
    assert!(sql.ends_with("ORDER BY \"count\" DESC"));
}

#[test]
fn test_relative_range_anchored() {
    let sql = compile(&AnalyticsQuery::new().with_time_range("24h"));
    assert!(sql.contains("ts >= '2024-03-14 12:00:00+00:00' AND ts <= '2024-03-15 12:00:00+00:00'"));
}

#[test]
fn test_limit_is_capped() {
    let query = AnalyticsQuery {
        limit: Some(50_000),
        ..AnalyticsQuery::default()
    };
    assert!(compile(&query).ends_with(&format!("LIMIT {}", MAX_LIMIT)));

    let query = AnalyticsQuery::new().with_limit(20);
    assert!(compile(&query).ends_with("LIMIT 20"));
}

#[test]
fn test_invalid_granularity() {
    let query = AnalyticsQuery::new().with_group_by("year");
    assert_eq!(
        QueryCompiler::default().compile_at(&query, now()),
        Err(AnalyticsError::InvalidGranularity("year".to_string()))
    );
}

#[test]
fn test_unsafe_breakdown() {
    let query = AnalyticsQuery::new().with_breakdown("payload.x\"; --");
    assert!(matches!(
        QueryCompiler::default().compile_at(&query, now()),
        Err(AnalyticsError::UnsafePathSegment { .. })
    ));
}

#[test]
fn test_unsafe_metric() {
    let query = AnalyticsQuery::new().with_metrics(["cost'"]);
    assert!(matches!(
        QueryCompiler::default().compile_at(&query, now()),
        Err(AnalyticsError::UnsafePathSegment { .. })
    ));
}

#[test]
fn test_invalid_time_range() {
    let query = AnalyticsQuery::new().with_time_range("forever");
    assert!(matches!(
        QueryCompiler::default().compile_at(&query, now()),
        Err(AnalyticsError::InvalidTimeRange(_))
    ));
}

#[test]
fn test_type_value_is_escaped() {
    let sql = compile(&AnalyticsQuery::new().with_types("x' OR '1'='1"));
    assert!(sql.contains("type = 'x'' OR ''1''=''1'"));
}

#[test]
fn test_custom_table_and_defaults() {
    let defaults = MetricDefaults::new(
        vec![PrefixMetrics {
            prefix: "job.".to_string(),
            metrics: vec!["rows".to_string()],
        }],
        vec!["durationMs".to_string()],
    );
    let compiler = QueryCompiler::new("kb_events", defaults);

    let sql = compiler
        .compile_at(&AnalyticsQuery::new().with_types("job.run"), now())
        .unwrap();
    assert!(sql.contains("FROM kb_events"));
    assert!(sql.contains("AS \"rows\""));
    assert!(!sql.contains("durationMs"));
    assert_eq!(compiler.table(), "kb_events");
}

#[test]
fn test_compile_is_deterministic() {
    let query = AnalyticsQuery::new()
        .with_types(vec!["cache.get".to_string(), "storage.put".to_string()])
        .with_group_by("week")
        .with_breakdown("ctx.region");
    assert_eq!(compile(&query), compile(&query));
}

#[test]
fn test_deserialize_request() {
    let json = r#"{
        "type": ["llm.completion"],
        "timeRange": "7d",
        "filters": [{ "field": "actor.type", "operator": "eq", "value": "user" }],
        "groupBy": "hour",
        "breakdownBy": ["source.product"],
        "metrics": ["totalTokens"],
        "limit": 100
    }"#;
    let query: AnalyticsQuery = serde_json::from_str(json).unwrap();

    assert_eq!(
        query.types,
        Some(TypeFilter::Multiple(vec!["llm.completion".to_string()]))
    );
    assert_eq!(query.group_by.as_deref(), Some("hour"));
    assert_eq!(query.breakdown_by, vec!["source.product"]);

    let sql = compile(&query);
    assert!(sql.contains("actor_type = 'user'"));
    assert!(sql.contains("product AS \"source.product\""));
    assert!(sql.ends_with("LIMIT 100"));
}

#[test]
fn test_deserialize_rejects_unknown_fields() {
    let result = serde_json::from_str::<AnalyticsQuery>(r#"{"granularity": "day"}"#);
    assert!(result.is_err());
}
