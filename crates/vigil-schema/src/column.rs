//! Per-field schema descriptors.
//!
//! Each persisted entity declares a static [`Schema`]: one [`Column`] per
//! field naming its declared type, its default, and its constraints. The
//! table is the single source of truth the serialization engine consults;
//! it is derived purely from the entity's declared field types and carries
//! no per-instance state.

use serde_json::{Map, Value};
use std::fmt;

use crate::constraint::Constraint;
use crate::hint::CollectionHint;

/// Declared type of a schema column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// UTF-8 text.
    Text,
    /// 64-bit signed integer.
    Integer,
    /// Boolean flag.
    Boolean,
    /// Wall-clock instant, carried as whole seconds past the epoch.
    Timestamp,
    /// Sub-document of the named described entity.
    Entity(&'static str),
    /// Homogeneous ordered sequence, element shape given by the hint.
    Collection(CollectionHint),
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Boolean => write!(f, "boolean"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Entity(entity) => write!(f, "{entity} sub-document"),
            Self::Collection(hint) => write!(f, "{hint}"),
        }
    }
}

/// Default applied when a field is absent at encode or decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    /// The natural zero value of the declared type: empty text, zero,
    /// false, the epoch origin, an empty sequence, or an empty
    /// sub-document.
    TypeDefault,
    /// The column is nullable and defaults to null.
    Null,
    /// A fixed text literal.
    Text(&'static str),
    /// A fixed integer literal.
    Integer(i64),
}

/// A single described field of a persisted entity.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Field name, as it appears in the primitive document.
    pub name: &'static str,
    /// Declared type.
    pub ty: ColumnType,
    /// Default value specification.
    pub default: ColumnDefault,
    /// Validation constraints checked before encoding.
    pub constraints: &'static [Constraint],
}

impl Column {
    /// Describe a field of the given declared type, with the type's
    /// natural default and no constraints.
    #[must_use]
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            default: ColumnDefault::TypeDefault,
            constraints: &[],
        }
    }

    /// Describe a text field.
    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnType::Text)
    }

    /// Describe an integer field.
    #[must_use]
    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    /// Describe a boolean field.
    #[must_use]
    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    /// Describe a timestamp field.
    #[must_use]
    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, ColumnType::Timestamp)
    }

    /// Describe a field holding a sub-document of the named entity.
    #[must_use]
    pub const fn entity(name: &'static str, entity: &'static str) -> Self {
        Self::new(name, ColumnType::Entity(entity))
    }

    /// Describe a collection field with the given element hint.
    #[must_use]
    pub const fn collection(name: &'static str, hint: CollectionHint) -> Self {
        Self::new(name, ColumnType::Collection(hint))
    }

    /// Override the column's default.
    #[must_use]
    pub const fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = default;
        self
    }

    /// Attach validation constraints.
    #[must_use]
    pub const fn with_constraints(mut self, constraints: &'static [Constraint]) -> Self {
        self.constraints = constraints;
        self
    }

    /// Whether the column admits null.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        matches!(self.default, ColumnDefault::Null)
    }

    /// Materialize the column's default as a primitive value.
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self.default {
            ColumnDefault::TypeDefault => match self.ty {
                ColumnType::Text => Value::String(String::new()),
                ColumnType::Integer | ColumnType::Timestamp => Value::from(0i64),
                ColumnType::Boolean => Value::Bool(false),
                ColumnType::Entity(_) => Value::Object(Map::new()),
                ColumnType::Collection(_) => Value::Array(Vec::new()),
            },
            ColumnDefault::Null => Value::Null,
            ColumnDefault::Text(text) => Value::from(text),
            ColumnDefault::Integer(number) => Value::from(number),
        }
    }
}

/// Field-by-field description of one persisted entity type.
///
/// Built once as a static, immutable afterwards, and safe to share across
/// arbitrarily many concurrent encode and decode calls.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    /// Entity name, used in error reporting and entity-typed columns.
    pub entity: &'static str,
    /// Described columns, in document order.
    pub columns: &'static [Column],
}

impl Schema {
    /// Look up a column by field name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hint::ScalarKind;
    use serde_json::json;

    static SAMPLE: Schema = Schema {
        entity: "sample",
        columns: &[
            Column::text("label"),
            Column::integer("retries").with_default(ColumnDefault::Integer(3)),
            Column::timestamp("closed_at"),
            Column::integer("finished_at").with_default(ColumnDefault::Null),
            Column::collection("tags", CollectionHint::scalar(ScalarKind::Text)),
            Column::text("reason").with_default(ColumnDefault::Text("none given")),
        ],
    };

    #[test]
    fn column_lookup() {
        assert_eq!(SAMPLE.column("label").unwrap().ty, ColumnType::Text);
        assert!(SAMPLE.column("missing").is_none());
    }

    #[test]
    fn type_defaults() {
        assert_eq!(SAMPLE.column("label").unwrap().default_value(), json!(""));
        assert_eq!(SAMPLE.column("closed_at").unwrap().default_value(), json!(0));
        assert_eq!(SAMPLE.column("tags").unwrap().default_value(), json!([]));
    }

    #[test]
    fn explicit_defaults() {
        assert_eq!(SAMPLE.column("retries").unwrap().default_value(), json!(3));
        assert_eq!(
            SAMPLE.column("reason").unwrap().default_value(),
            json!("none given")
        );
    }

    #[test]
    fn nullable_columns() {
        let finished = SAMPLE.column("finished_at").unwrap();
        assert!(finished.is_nullable());
        assert_eq!(finished.default_value(), Value::Null);
        assert!(!SAMPLE.column("retries").unwrap().is_nullable());
    }
}
