//! Error types for listkeep-core

use thiserror::Error;

/// Result type alias using listkeep-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in listkeep-core operations
///
/// Missing records are not errors: lookups return `Option`/`bool` so callers
/// can branch without matching on an error variant.
#[derive(Error, Debug)]
pub enum Error {
    /// Key-value store rejected a read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// `SQLite` error from the bundled key-value backend
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
