//! Error types for the schema and serialization layer.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// A result type using `SchemaError`.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors that can occur while encoding or decoding documents.
///
/// All variants are local, recoverable conditions: the caller receives
/// either a fully-populated document/entity or one of these, never a
/// partial result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A field value violated one of its declared constraints.
    #[error("validation failed for field {field}: {rule}")]
    Validation {
        /// The offending field.
        field: String,
        /// The rule that failed.
        rule: &'static str,
    },

    /// A decoded value's shape does not match the field's declared type.
    #[error("type mismatch for field {field}: expected {expected}, got {got}")]
    TypeMismatch {
        /// Path of the offending field, with collection indices
        /// (`logs[1]`) where applicable.
        field: String,
        /// The declared type.
        expected: String,
        /// The shape that was actually received.
        got: String,
    },

    /// A discriminator value has no matching variant.
    #[error("unsupported variant {variant:?} for discriminator {field}")]
    UnsupportedVariant {
        /// The discriminator field.
        field: &'static str,
        /// The unrecognized tag.
        variant: String,
    },

    /// A field was requested that the entity's schema does not declare.
    ///
    /// This indicates a mismatch between an entity's field accessors and
    /// its schema table, not bad input data.
    #[error("entity {entity} has no column named {field}")]
    UnknownColumn {
        /// The entity whose schema was consulted.
        entity: &'static str,
        /// The undeclared field name.
        field: String,
    },
}

impl SchemaError {
    /// Build a type-mismatch error from the received primitive value.
    #[must_use]
    pub fn mismatch(field: impl Into<String>, expected: impl fmt::Display, got: &Value) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected: expected.to_string(),
            got: crate::engine::shape_name(got).to_string(),
        }
    }
}
