//! Tests for statement assembly

use crate::builder::{Direction, SelectStatement, quote_ident};
use crate::granularity::Granularity;

#[test]
fn test_projections_in_order() {
    let sql = SelectStatement::new("events")
        .project("type")
        .project_as("COUNT(*)", "total")
        .build();

    assert_eq!(sql, "SELECT type, COUNT(*) AS total FROM events");
}

#[test]
fn test_no_projection_selects_all() {
    assert_eq!(SelectStatement::new("events").build(), "SELECT * FROM events");
}

#[test]
fn test_predicates_are_anded() {
    let sql = SelectStatement::new("events")
        .filter("type = 'llm.completion'")
        .filter("product = 'search'")
        .build();

    assert_eq!(
        sql,
        "SELECT * FROM events WHERE type = 'llm.completion' AND product = 'search'"
    );
}

#[test]
fn test_clause_order() {
    let sql = SelectStatement::new("events")
        .limit(5)
        .order("n", Direction::Desc)
        .group("type")
        .filter("ts IS NOT NULL")
        .project("type")
        .project_as("COUNT(*)", "n")
        .order("type", Direction::Asc)
        .build();

    assert_eq!(
        sql,
        "SELECT type, COUNT(*) AS n FROM events WHERE ts IS NOT NULL \
         GROUP BY type ORDER BY n DESC, type LIMIT 5"
    );
}

#[test]
fn test_bucket_leads_the_statement() {
    let sql = SelectStatement::new("events")
        .project_as("COUNT(*)", "n")
        .order("n", Direction::Desc)
        .bucketed(Granularity::Day, "ts", "bucket")
        .build();

    assert_eq!(
        sql,
        "SELECT to_char(date_trunc('day', ts), 'YYYY-MM-DD') AS bucket, COUNT(*) AS n \
         FROM events GROUP BY bucket ORDER BY bucket, n DESC"
    );
}

#[test]
fn test_dimension_groups_by_expression() {
    let sql = SelectStatement::new("events")
        .bucketed(Granularity::Month, "ts", "bucket")
        .dimension("actor_id", "\"actor.id\"")
        .build();

    assert!(sql.contains("AS bucket, actor_id AS \"actor.id\" FROM"));
    assert!(sql.contains("GROUP BY bucket, actor_id ORDER BY bucket"));
}

#[test]
fn test_is_ordered() {
    assert!(!SelectStatement::new("events").is_ordered());
    assert!(
        SelectStatement::new("events")
            .bucketed(Granularity::Week, "ts", "bucket")
            .is_ordered()
    );
}

#[test]
fn test_quote_ident() {
    assert_eq!(quote_ident("totalCost"), "\"totalCost\"");
    assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
}
