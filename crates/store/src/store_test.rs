//! Tests for the event store

use chrono::{TimeZone, Utc};
use kb_analytics::{Actor, Event, Source};
use serde_json::json;

use crate::{EventStore, SchemaObject, StoreError};

fn event(id: &str, event_type: &str) -> Event {
    Event::new(
        id,
        event_type,
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    )
}

fn object(kind: &str, name: &str) -> SchemaObject {
    SchemaObject {
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

#[tokio::test]
async fn test_schema_objects() {
    let store = EventStore::new_memory().await.unwrap();

    assert_eq!(
        store.schema_objects().await.unwrap(),
        vec![
            object("table", "events"),
            object("index", "idx_events_product"),
            object("index", "idx_events_ts"),
            object("index", "idx_events_type"),
            object("index", "idx_events_type_ts"),
        ]
    );
}

#[tokio::test]
async fn test_init_schema_is_idempotent() {
    let store = EventStore::new_memory().await.unwrap();
    let before = store.schema_objects().await.unwrap();

    store.init_schema().await.unwrap();
    store.init_schema().await.unwrap();

    assert_eq!(store.schema_objects().await.unwrap(), before);
}

#[tokio::test]
async fn test_init_schema_keeps_data() {
    let store = EventStore::new_memory().await.unwrap();
    store.append(&event("e1", "llm.completion")).await.unwrap();

    store.init_schema().await.unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_append_and_get() {
    let store = EventStore::new_memory().await.unwrap();

    let original = event("e1", "llm.completion")
        .with_run_id("run-7")
        .with_source(Source {
            product: Some("search".into()),
            version: Some("2.1.0".into()),
        })
        .with_actor(Actor {
            actor_type: Some("user".into()),
            id: Some("u1".into()),
            name: None,
        })
        .with_ctx(json!({"sessionId": "s1"}))
        .with_payload(json!({"totalTokens": 120, "model": "gpt-4"}));

    store.append(&original).await.unwrap();

    let found = store.get("e1").await.unwrap().unwrap();
    assert_eq!(found, original);
}

#[tokio::test]
async fn test_get_missing() {
    let store = EventStore::new_memory().await.unwrap();
    assert!(store.get("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_append_is_insert_only() {
    let store = EventStore::new_memory().await.unwrap();
    store.append(&event("e1", "llm.completion")).await.unwrap();

    let result = store.append(&event("e1", "cache.get")).await;
    assert!(matches!(result, Err(StoreError::AlreadyExists(id)) if id == "e1"));

    let stored = store.get("e1").await.unwrap().unwrap();
    assert_eq!(stored.event_type, "llm.completion");
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_append_rejects_invalid() {
    let store = EventStore::new_memory().await.unwrap();

    let result = store.append(&event("", "llm.completion")).await;
    assert!(matches!(result, Err(StoreError::InvalidEvent(_))));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_append_all() {
    let store = EventStore::new_memory().await.unwrap();
    let events = vec![
        event("e1", "llm.completion"),
        event("e2", "embeddings.create"),
        event("e3", "cache.get"),
    ];

    assert_eq!(store.append_all(&events).await.unwrap(), 3);
    assert_eq!(store.count().await.unwrap(), 3);
    assert!(store.exists("e2").await.unwrap());
    assert!(!store.exists("e4").await.unwrap());
}

#[tokio::test]
async fn test_custom_table() {
    let store = EventStore::open_with_table(":memory:", "kb_events")
        .await
        .unwrap();
    assert_eq!(store.table(), "kb_events");

    store.append(&event("e1", "llm.completion")).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.schema_objects().await.unwrap()[0], object("table", "kb_events"));
}

#[tokio::test]
async fn test_reopen_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("events.db");

    {
        let store = EventStore::open(&path).await.unwrap();
        store.append(&event("e1", "llm.completion")).await.unwrap();
    }

    // Reopening replays the DDL against the existing file
    let store = EventStore::open(&path).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.schema_objects().await.unwrap().len(), 5);
}
