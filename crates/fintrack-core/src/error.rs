//! Error types for fintrack-core

use thiserror::Error;

/// Result type alias using fintrack-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fintrack-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A remote change set failed to apply
    #[error("Remote migration '{tag}' failed: {message}")]
    Migration { tag: String, message: String },

    /// Another sync session is already running
    #[error("A sync session is already in progress")]
    SyncInProgress,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
