//! Error types for dbflat

use thiserror::Error;

/// Core error type for collaborator operations
#[derive(Error, Debug)]
pub enum DbflatError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cancelled")]
    Cancelled,
}

/// Result type alias for dbflat operations
pub type Result<T> = std::result::Result<T, DbflatError>;
