//! kb Event Store
//!
//! Append-only storage for `kb.v1` events on an embedded, SQLite-compatible
//! database (Turso).
//!
//! The schema comes from `kb_analytics::schema` and is applied with
//! `IF NOT EXISTS` statements, so opening an existing store, or calling
//! [`EventStore::init_schema`] again, never fails and never duplicates an
//! object. Events are inserted once and never updated or deleted.
//!
//! # Usage
//!
//! ```ignore
//! use kb_store::EventStore;
//!
//! let store = EventStore::open("data/events.db").await?;
//! store.append(&event).await?;
//! println!("{} events", store.count().await?);
//! ```

mod error;

use std::path::Path;

use chrono::{DateTime, Utc};
use kb_analytics::schema::{COLUMNS, EVENTS_TABLE, ddl_statements};
use kb_analytics::{Actor, Event, Source};
use tracing::{debug, info};
use turso::{Builder, Database};

pub use error::{Result, StoreError};

/// In-memory database path
pub const MEMORY_PATH: &str = ":memory:";

/// A schema object (table or index) present in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaObject {
    /// `table` or `index`
    pub kind: String,
    /// Object name
    pub name: String,
}

/// Append-only event store
pub struct EventStore {
    db: Database,
    table: String,
}

impl EventStore {
    /// Open (or create) a file-backed store and initialize its schema
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_table(path, EVENTS_TABLE).await
    }

    /// Open a store using a custom table name
    pub async fn open_with_table(path: impl AsRef<Path>, table: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        if path_str != MEMORY_PATH
            && let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
        }

        info!(path = %path_str, "Opening event store");
        let db = Builder::new_local(&path_str).build().await?;

        let store = Self {
            db,
            table: table.into(),
        };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub async fn new_memory() -> Result<Self> {
        Self::open_with_table(MEMORY_PATH, EVENTS_TABLE).await
    }

    /// Table events are stored in
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Apply the event table DDL
    ///
    /// Safe to call any number of times.
    pub async fn init_schema(&self) -> Result<()> {
        let conn = self.db.connect()?;

        for statement in ddl_statements(&self.table) {
            conn.execute(&statement, ()).await?;
        }

        info!(table = %self.table, "Event store schema initialized");
        Ok(())
    }

    /// Append one event
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the id is taken; stored
    /// events are never overwritten. Empty optional strings are stored as
    /// NULL.
    pub async fn append(&self, event: &Event) -> Result<()> {
        event.validate()?;

        if self.exists(&event.id).await? {
            return Err(StoreError::AlreadyExists(event.id.clone()));
        }

        let values = event.column_values();
        let params: Vec<&str> = values.iter().map(|v| v.as_deref().unwrap_or("")).collect();
        let params: [&str; COLUMNS.len()] = params
            .as_slice()
            .try_into()
            .map_err(|_| StoreError::corrupt(&event.id, "column count mismatch"))?;

        let conn = self.db.connect()?;
        conn.execute(&self.insert_sql(), params).await?;

        debug!(id = %event.id, event_type = %event.event_type, "Appended event");
        Ok(())
    }

    /// Append many events, stopping at the first failure
    ///
    /// Returns the number appended.
    pub async fn append_all<'a>(&self, events: impl IntoIterator<Item = &'a Event>) -> Result<u64> {
        let mut appended = 0;
        for event in events {
            self.append(event).await?;
            appended += 1;
        }
        Ok(appended)
    }

    /// Whether an event with this id is stored
    pub async fn exists(&self, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?1", self.table);

        let mut rows = conn.query(&sql, [id]).await?;
        if let Some(row) = rows.next().await? {
            let count: i64 = row.get(0)?;
            Ok(count > 0)
        } else {
            Ok(false)
        }
    }

    /// Number of stored events
    pub async fn count(&self) -> Result<u64> {
        let conn = self.db.connect()?;
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);

        let mut rows = conn.query(&sql, ()).await?;
        if let Some(row) = rows.next().await? {
            let count: i64 = row.get(0)?;
            Ok(count as u64)
        } else {
            Ok(0)
        }
    }

    /// Get an event by id
    pub async fn get(&self, id: &str) -> Result<Option<Event>> {
        let conn = self.db.connect()?;

        let mut rows = conn.query(&self.select_sql(), [id]).await?;
        if let Some(row) = rows.next().await? {
            let mut values = Vec::with_capacity(COLUMNS.len());
            for i in 0..COLUMNS.len() {
                let value: String = row.get(i)?;
                values.push(value);
            }
            Ok(Some(row_to_event(id, values)?))
        } else {
            Ok(None)
        }
    }

    /// Tables and indexes belonging to the event table
    pub async fn schema_objects(&self) -> Result<Vec<SchemaObject>> {
        let conn = self.db.connect()?;

        let mut rows = conn
            .query(
                "SELECT type, name FROM sqlite_master \
                 WHERE tbl_name = ?1 AND name NOT LIKE 'sqlite_%' ORDER BY type DESC, name",
                [self.table.as_str()],
            )
            .await?;

        let mut objects = Vec::new();
        while let Some(row) = rows.next().await? {
            objects.push(SchemaObject {
                kind: row.get(0)?,
                name: row.get(1)?,
            });
        }
        Ok(objects)
    }

    fn insert_sql(&self) -> String {
        let names: Vec<&str> = COLUMNS.iter().map(|c| c.name).collect();
        let placeholders: Vec<String> = COLUMNS
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if c.nullable {
                    format!("NULLIF(?{}, '')", i + 1)
                } else {
                    format!("?{}", i + 1)
                }
            })
            .collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            names.join(", "),
            placeholders.join(", ")
        )
    }

    fn select_sql(&self) -> String {
        let columns: Vec<String> = COLUMNS
            .iter()
            .map(|c| format!("COALESCE({}, '')", c.name))
            .collect();
        format!(
            "SELECT {} FROM {} WHERE id = ?1",
            columns.join(", "),
            self.table
        )
    }
}

/// Rebuild an event from `COLUMNS`-ordered text values
fn row_to_event(id: &str, values: Vec<String>) -> Result<Event> {
    let mut values = values.into_iter();
    let mut next = || values.next().unwrap_or_default();
    let optional = |s: String| if s.is_empty() { None } else { Some(s) };

    let event_id = next();
    let schema = next();
    let event_type = next();
    let ts = parse_ts(id, &next())?;
    let ingest_ts = match optional(next()) {
        Some(s) => Some(parse_ts(id, &s)?),
        None => None,
    };
    let run_id = optional(next());
    let source = Source {
        product: optional(next()),
        version: optional(next()),
    };
    let actor = Actor {
        actor_type: optional(next()),
        id: optional(next()),
        name: optional(next()),
    };
    let ctx = parse_doc(&next())?;
    let payload = parse_doc(&next())?;

    Ok(Event {
        id: event_id,
        schema,
        event_type,
        ts,
        ingest_ts,
        run_id,
        source,
        actor,
        ctx,
        payload,
    })
}

fn parse_ts(id: &str, s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::corrupt(id, format!("bad timestamp {:?}: {}", s, e)))
}

fn parse_doc(s: &str) -> Result<serde_json::Value> {
    if s.is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    Ok(serde_json::from_str(s)?)
}

#[cfg(test)]
mod store_test;
