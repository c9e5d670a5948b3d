//! Store error types

use thiserror::Error;

/// Errors raised by the SQLite index store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database connection could not be established
    #[error("Failed to open index store: {0}")]
    OpenFailed(String),

    /// Schema migration failed
    #[error("Failed to migrate index store schema: {0}")]
    MigrationFailed(String),

    /// A statement batch failed to execute
    #[error("Failed to execute statement: {0}")]
    ExecuteFailed(String),

    /// A row could not be mapped back into its tuple shape
    #[error("Malformed row in table {table}: {reason}")]
    MalformedRow { table: String, reason: String },

    /// The store is closed (backup upload in progress)
    #[error("Index store is closed")]
    Closed,
}
