//! Error types for the storage boundary.

use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The requested run record was not found.
    #[error("run not found")]
    NotFound,

    /// A primary-key column is not described by the supplied schema.
    #[error("primary key names a column the schema does not describe: {column}")]
    UnknownKeyColumn {
        /// The undescribed column.
        column: &'static str,
    },

    /// A backend error occurred.
    #[error("database error: {0}")]
    Database(String),
}
