//! Error types for the library seams.

use thiserror::Error;

/// Failure talking to the key-value store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing `key` would exceed the store's byte quota
    #[error("quota exceeded writing '{key}' ({size} bytes, limit {limit})")]
    QuotaExceeded { key: String, size: usize, limit: usize },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Rejected import payload
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed import payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("import payload must be a JSON object")]
    NotAnObject,
}
