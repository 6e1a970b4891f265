//! Event table layout
//!
//! Canonical column set and index set of the `events` table. Every statement
//! uses `IF NOT EXISTS` so the DDL can be replayed against an initialized
//! store without error.

/// Schema version written into every event
pub const SCHEMA_VERSION: &str = "kb.v1";

/// Default event table name
pub const EVENTS_TABLE: &str = "events";

/// Event timestamp column (ordering and bucketing)
pub const TIMESTAMP_COLUMN: &str = "ts";

/// A physical column of the event table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name
    pub name: &'static str,
    /// SQL type
    pub sql_type: &'static str,
    /// Whether NULL is allowed
    pub nullable: bool,
    /// Column constraint or default, appended verbatim
    pub extra: Option<&'static str>,
}

impl Column {
    const fn required(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: false,
            extra: None,
        }
    }

    const fn optional(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: true,
            extra: None,
        }
    }

    const fn with_extra(mut self, extra: &'static str) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Render as a column definition inside `CREATE TABLE`
    pub fn definition(&self) -> String {
        let mut def = format!("{} {}", self.name, self.sql_type);
        if !self.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(extra) = self.extra {
            def.push(' ');
            def.push_str(extra);
        }
        def
    }
}

/// Columns of the `events` table, in declaration order
pub const COLUMNS: &[Column] = &[
    Column::required("id", "TEXT").with_extra("PRIMARY KEY"),
    Column::required("schema", "TEXT").with_extra("DEFAULT 'kb.v1'"),
    Column::required("type", "TEXT"),
    Column::required("ts", "TIMESTAMPTZ"),
    Column::optional("ingest_ts", "TIMESTAMPTZ"),
    Column::optional("run_id", "TEXT"),
    Column::optional("product", "TEXT"),
    Column::optional("version", "TEXT"),
    Column::optional("actor_type", "TEXT"),
    Column::optional("actor_id", "TEXT"),
    Column::optional("actor_name", "TEXT"),
    Column::optional("ctx", "JSON"),
    Column::optional("payload", "JSON"),
];

/// A secondary index of the `events` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    /// Index name
    pub name: &'static str,
    /// Indexed columns, in key order
    pub columns: &'static [&'static str],
}

/// Indexes of the `events` table
///
/// `(type, ts)` serves the dominant "events of type X over a range" scan.
pub const INDEXES: &[Index] = &[
    Index {
        name: "idx_events_ts",
        columns: &["ts"],
    },
    Index {
        name: "idx_events_type",
        columns: &["type"],
    },
    Index {
        name: "idx_events_product",
        columns: &["product"],
    },
    Index {
        name: "idx_events_type_ts",
        columns: &["type", "ts"],
    },
];

/// Look up a column by name
pub fn column(name: &str) -> Option<&'static Column> {
    COLUMNS.iter().find(|c| c.name == name)
}

/// `CREATE TABLE IF NOT EXISTS` statement for the event table
pub fn create_table_sql(table: &str) -> String {
    let defs: Vec<String> = COLUMNS.iter().map(Column::definition).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        table,
        defs.join(",\n    ")
    )
}

/// `CREATE INDEX IF NOT EXISTS` statements, one per index
pub fn create_index_sql(table: &str) -> Vec<String> {
    INDEXES
        .iter()
        .map(|idx| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {}({})",
                idx.name,
                table,
                idx.columns.join(", ")
            )
        })
        .collect()
}

/// Full DDL: table first, then indexes
pub fn ddl_statements(table: &str) -> Vec<String> {
    let mut statements = vec![create_table_sql(table)];
    statements.extend(create_index_sql(table));
    statements
}
