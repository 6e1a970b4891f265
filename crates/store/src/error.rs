//! Event store error types

use kb_analytics::AnalyticsError;
use thiserror::Error;

/// Event store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] turso::Error),

    /// Event failed validation
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] AnalyticsError),

    /// An event with this id is already stored
    #[error("event already exists: {0}")]
    AlreadyExists(String),

    /// JSON serialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored row could not be decoded
    #[error("corrupt row for event {id}: {message}")]
    Corrupt { id: String, message: String },

    /// Filesystem error
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Create a corrupt row error
    pub fn corrupt(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            id: id.into(),
            message: message.into(),
        }
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
