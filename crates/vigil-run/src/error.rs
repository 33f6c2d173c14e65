//! Error types for run record mutations.

use thiserror::Error;

/// A result type using `RunError`.
pub type Result<T> = std::result::Result<T, RunError>;

/// Errors that can occur while mutating a run record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    /// A resource with the same name is already attached.
    #[error("resource already attached: {0:?}")]
    DuplicateResource(String),

    /// No attached resource carries the given name.
    #[error("resource not found: {0:?}")]
    ResourceNotFound(String),
}
