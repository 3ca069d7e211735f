//! Error types for cardvault-core

use thiserror::Error;

use crate::catalog::CatalogError;

/// Result type alias using cardvault-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cardvault-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// External catalog provider error
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The running sync pass was cancelled by its caller
    #[error("Catalog sync cancelled")]
    Cancelled,
}
