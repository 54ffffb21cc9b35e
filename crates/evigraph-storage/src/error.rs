//! Storage error types for evigraph-storage.
//!
//! [`StorageError`] covers all anticipated failure modes in the storage
//! layer: serialization, database faults, and entity-not-found variants.
//! Any of these returned from a batched read means the store itself failed;
//! an individual absent or unreadable document is reported by omission, not
//! by error.

use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The underlying SQLite database failed.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Schema migration failed while opening the database.
    #[error("migration error: {0}")]
    Migration(String),

    /// A catalog record with the given id was not found.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// An evidence graph with the given id was not found.
    #[error("graph not found: {0}")]
    GraphNotFound(String),
}
