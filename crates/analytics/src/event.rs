//! Event record
//!
//! The immutable unit stored in the `events` table. Actor and source are
//! nested in the JSON form and flattened into columns on storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AnalyticsError, Result};
use crate::schema::{COLUMNS, SCHEMA_VERSION};

/// Who produced the event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub actor_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Which product build emitted the event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A `kb.v1` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique, never reused
    pub id: String,
    /// Schema version tag
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Dot-namespaced type, e.g. `llm.completion`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event time
    pub ts: DateTime<Utc>,
    /// Ingestion time, when different from event time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingest_ts: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub actor: Actor,
    /// Context document
    #[serde(default = "empty_object")]
    pub ctx: Value,
    /// Payload document (metrics live here)
    #[serde(default = "empty_object")]
    pub payload: Value,
}

fn default_schema() -> String {
    SCHEMA_VERSION.to_string()
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl Event {
    /// Create an event with empty documents
    pub fn new(id: impl Into<String>, event_type: impl Into<String>, ts: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            schema: default_schema(),
            event_type: event_type.into(),
            ts,
            ingest_ts: None,
            run_id: None,
            source: Source::default(),
            actor: Actor::default(),
            ctx: empty_object(),
            payload: empty_object(),
        }
    }

    /// Set the payload document
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Set the context document
    pub fn with_ctx(mut self, ctx: Value) -> Self {
        self.ctx = ctx;
        self
    }

    /// Set the actor
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    /// Set the run id
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(AnalyticsError::MissingField("id".to_string()));
        }
        if self.event_type.trim().is_empty() {
            return Err(AnalyticsError::MissingField("type".to_string()));
        }
        Ok(())
    }

    /// Column values in `schema::COLUMNS` order
    ///
    /// Timestamps are RFC 3339, documents are serialized JSON.
    pub fn column_values(&self) -> Vec<Option<String>> {
        COLUMNS
            .iter()
            .map(|column| match column.name {
                "id" => Some(self.id.clone()),
                "schema" => Some(self.schema.clone()),
                "type" => Some(self.event_type.clone()),
                "ts" => Some(self.ts.to_rfc3339()),
                "ingest_ts" => self.ingest_ts.map(|ts| ts.to_rfc3339()),
                "run_id" => self.run_id.clone(),
                "product" => self.source.product.clone(),
                "version" => self.source.version.clone(),
                "actor_type" => self.actor.actor_type.clone(),
                "actor_id" => self.actor.id.clone(),
                "actor_name" => self.actor.name.clone(),
                "ctx" => Some(self.ctx.to_string()),
                "payload" => Some(self.payload.to_string()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_deserialize_minimal() {
        let event: Event = serde_json::from_str(
            r#"{"id": "e1", "type": "llm.completion", "ts": "2024-05-01T09:30:00Z"}"#,
        )
        .unwrap();

        assert_eq!(event.schema, "kb.v1");
        assert_eq!(event.ts, ts());
        assert_eq!(event.payload, json!({}));
        assert_eq!(event.actor, Actor::default());
    }

    #[test]
    fn test_deserialize_full() {
        let event: Event = serde_json::from_str(
            r#"{
                "id": "e2",
                "schema": "kb.v1",
                "type": "cache.get",
                "ts": "2024-05-01T09:30:00Z",
                "ingestTs": "2024-05-01T09:30:05Z",
                "runId": "r1",
                "source": {"product": "search", "version": "1.2.0"},
                "actor": {"type": "user", "id": "u1", "name": "Ada"},
                "ctx": {"sessionId": "s1"},
                "payload": {"hits": 3}
            }"#,
        )
        .unwrap();

        assert_eq!(event.run_id.as_deref(), Some("r1"));
        assert_eq!(event.source.product.as_deref(), Some("search"));
        assert_eq!(event.actor.actor_type.as_deref(), Some("user"));
        assert_eq!(event.payload["hits"], 3);
    }

    #[test]
    fn test_validate() {
        assert!(Event::new("e1", "llm.completion", ts()).validate().is_ok());
        assert_eq!(
            Event::new("", "llm.completion", ts()).validate(),
            Err(AnalyticsError::MissingField("id".to_string()))
        );
        assert_eq!(
            Event::new("e1", " ", ts()).validate(),
            Err(AnalyticsError::MissingField("type".to_string()))
        );
    }

    #[test]
    fn test_column_values_follow_schema() {
        let event = Event::new("e1", "llm.completion", ts())
            .with_run_id("r1")
            .with_source(Source {
                product: Some("search".into()),
                version: None,
            })
            .with_actor(Actor {
                actor_type: Some("agent".into()),
                id: Some("a1".into()),
                name: None,
            })
            .with_payload(json!({"totalCost": 0.5}));

        let values = event.column_values();
        assert_eq!(values.len(), COLUMNS.len());
        assert_eq!(
            values,
            vec![
                Some("e1".to_string()),
                Some("kb.v1".to_string()),
                Some("llm.completion".to_string()),
                Some("2024-05-01T09:30:00+00:00".to_string()),
                None,
                Some("r1".to_string()),
                Some("search".to_string()),
                None,
                Some("agent".to_string()),
                Some("a1".to_string()),
                None,
                Some("{}".to_string()),
                Some("{\"totalCost\":0.5}".to_string()),
            ]
        );
    }
}
