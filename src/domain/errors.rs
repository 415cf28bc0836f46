//! Domain error types
//!
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Settlecheck error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum SettlecheckError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Source-reader errors (ERP or ticketing system)
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Merge-store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Snapshot export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Notification errors
    #[error("Notification error: {0}")]
    Notify(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Source-reader errors
///
/// Errors that occur when reading from the ERP or the ticketing system.
/// These don't expose the underlying database driver types.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to connect to the source system after exhausting retries
    #[error("Failed to connect to {system}: {message}")]
    ConnectionFailed { system: String, message: String },

    /// Query execution failed
    #[error("Query failed on {system}: {message}")]
    QueryFailed { system: String, message: String },

    /// A required identifier was not supplied to a reader operation
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// A row could not be decoded into the expected shape
    #[error("Invalid row from {system}: {message}")]
    InvalidRow { system: String, message: String },
}

/// Merge-store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to open or create the local store
    #[error("Failed to open store: {0}")]
    OpenFailed(String),

    /// Conflicting merge-column arguments
    #[error("Options 'match_columns' and 'exclude_columns' cannot be used together")]
    ConflictingColumnOptions,

    /// SQL execution failed
    #[error("Statement failed: {0}")]
    StatementFailed(String),

    /// Table manifest could not be loaded or persisted
    #[error("Manifest error for table '{table}': {message}")]
    Manifest { table: String, message: String },

    /// Incoming batch rows do not share a usable column shape
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::StatementFailed(err.to_string())
    }
}

impl From<std::io::Error> for SettlecheckError {
    fn from(err: std::io::Error) -> Self {
        SettlecheckError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SettlecheckError {
    fn from(err: serde_json::Error) -> Self {
        SettlecheckError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SettlecheckError {
    fn from(err: toml::de::Error) -> Self {
        SettlecheckError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<rusqlite::Error> for SettlecheckError {
    fn from(err: rusqlite::Error) -> Self {
        SettlecheckError::Store(StoreError::from(err))
    }
}
