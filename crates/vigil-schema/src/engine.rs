//! Bidirectional conversion between typed entities and primitive documents.
//!
//! [`encode`] walks an entity's static [`Schema`] field by field: values
//! the instance did not supply fall back to the column default, every
//! value is checked against the column's constraints and declared type,
//! and nested entities are encoded recursively. [`decode`] is the inverse
//! walk through a [`FieldReader`]: unknown document keys are ignored,
//! missing keys are default-filled, and any shape the schema does not
//! declare surfaces as a field-addressed type-mismatch error.
//!
//! For any entity whose fields satisfy their constraints,
//! `decode(encode(x))` reproduces `x` field for field, including enum
//! identity and collection order.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::column::{ColumnType, Schema};
use crate::error::{Result, SchemaError};
use crate::hint::{CollectionHint, ElementShape};

/// A type whose instances are persisted through a static schema table.
pub trait Persisted: Sized {
    /// Entity name, matching the `entity` of [`Persisted::schema`].
    const ENTITY: &'static str;

    /// The schema table describing this entity's fields.
    fn schema() -> &'static Schema;

    /// Dump this instance's fields as primitive values.
    ///
    /// No validation or default filling happens here; [`encode`] applies
    /// both against the schema afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if a nested entity fails to encode.
    fn encode_fields(&self) -> Result<Map<String, Value>>;

    /// Rebuild an instance from a default-filling document view.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be coerced to its declared type.
    fn decode_fields(fields: &FieldReader<'_>) -> Result<Self>;
}

/// A tagged union persisted with a discriminator field.
///
/// Encoding writes the discriminator next to the concrete variant's own
/// fields; decoding reads the discriminator first and dispatches to the
/// matching variant's schema.
pub trait Polymorphic: Sized {
    /// Name of the discriminator field.
    const DISCRIMINATOR: &'static str;

    /// Wire tag of this value's concrete variant.
    fn variant_tag(&self) -> &'static str;

    /// Encode the concrete variant's fields, without the discriminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the variant's entity fails to encode.
    fn encode_variant(&self) -> Result<Value>;

    /// Decode the variant named by `tag` from `doc`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedVariant`] if `tag` names no
    /// variant, or a decode error from the variant's own schema.
    fn decode_variant(tag: &str, doc: &Value) -> Result<Self>;
}

/// A closed enumeration with canonical lowercase wire names.
pub trait WireEnum: Sized + Copy {
    /// Human-readable description of the member set, used in errors.
    const EXPECTED: &'static str;

    /// The canonical wire name of this member.
    fn as_wire(&self) -> &'static str;

    /// Parse a member from its wire name.
    fn from_wire(s: &str) -> Option<Self>;
}

/// Human-readable name of a primitive value's shape, used in errors.
#[must_use]
pub fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) => {
            if number.as_i64().is_some() {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Encode `entity` into a primitive document.
///
/// # Errors
///
/// Returns [`SchemaError::Validation`] if a field violates one of its
/// constraints, or [`SchemaError::TypeMismatch`] if a supplied value does
/// not have its declared shape.
pub fn encode<T: Persisted>(entity: &T) -> Result<Value> {
    let schema = T::schema();
    let mut raw = entity.encode_fields()?;
    let mut doc = Map::new();

    for column in schema.columns {
        let value = raw
            .remove(column.name)
            .unwrap_or_else(|| column.default_value());

        for constraint in column.constraints {
            if !constraint.holds(&value) {
                return Err(SchemaError::Validation {
                    field: column.name.to_string(),
                    rule: constraint.rule(),
                });
            }
        }

        check_shape(column.name, column.ty, column.is_nullable(), &value)?;
        doc.insert(column.name.to_string(), value);
    }

    Ok(Value::Object(doc))
}

/// Decode an instance of `T` from a primitive document.
///
/// Keys the schema does not describe are ignored; keys the document does
/// not carry are filled from the schema defaults.
///
/// # Errors
///
/// Returns [`SchemaError::TypeMismatch`] if the document is not a mapping
/// or a field cannot be coerced to its declared type.
pub fn decode<T: Persisted>(doc: &Value) -> Result<T> {
    let Some(fields) = doc.as_object() else {
        return Err(SchemaError::mismatch(
            T::ENTITY,
            format!("{} sub-document", T::ENTITY),
            doc,
        ));
    };

    T::decode_fields(&FieldReader {
        schema: T::schema(),
        fields,
    })
}

/// Encode a polymorphic value, injecting its discriminator field.
///
/// # Errors
///
/// Returns an error if the concrete variant fails to encode.
pub fn encode_poly<T: Polymorphic>(value: &T) -> Result<Value> {
    match value.encode_variant()? {
        Value::Object(mut fields) => {
            fields.insert(
                T::DISCRIMINATOR.to_string(),
                Value::from(value.variant_tag()),
            );
            Ok(Value::Object(fields))
        }
        other => Err(SchemaError::mismatch(
            T::DISCRIMINATOR,
            "variant sub-document",
            &other,
        )),
    }
}

/// Decode a polymorphic value by its discriminator field.
///
/// # Errors
///
/// Returns [`SchemaError::TypeMismatch`] if the discriminator is missing
/// or not a string, [`SchemaError::UnsupportedVariant`] if it names no
/// variant, or a decode error from the selected variant's schema.
pub fn decode_poly<T: Polymorphic>(doc: &Value) -> Result<T> {
    let tag_value = doc.get(T::DISCRIMINATOR).cloned().unwrap_or(Value::Null);
    let Some(tag) = tag_value.as_str() else {
        return Err(SchemaError::mismatch(T::DISCRIMINATOR, "string", &tag_value));
    };

    T::decode_variant(tag, doc)
}

/// Encode a slice of described entities as a sequence of sub-documents.
///
/// An empty slice encodes as an empty sequence.
///
/// # Errors
///
/// Returns the first error produced by encoding an element.
pub fn encode_list<T: Persisted>(items: &[T]) -> Result<Value> {
    items
        .iter()
        .map(encode)
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// Encode a wall-clock instant as whole seconds past the epoch.
#[must_use]
pub fn timestamp_value(instant: DateTime<Utc>) -> Value {
    Value::from(instant.timestamp())
}

/// Encode string pairs as a sequence of 2-element sequences.
#[must_use]
pub fn pairs_value(pairs: &[(String, String)]) -> Value {
    Value::Array(
        pairs
            .iter()
            .map(|(first, second)| {
                Value::Array(vec![Value::from(first.clone()), Value::from(second.clone())])
            })
            .collect(),
    )
}

fn check_shape(field: &str, ty: ColumnType, nullable: bool, value: &Value) -> Result<()> {
    if nullable && value.is_null() {
        return Ok(());
    }

    let ok = match ty {
        ColumnType::Text => value.is_string(),
        ColumnType::Integer | ColumnType::Timestamp => value.as_i64().is_some(),
        ColumnType::Boolean => value.is_boolean(),
        ColumnType::Entity(_) => value.is_object(),
        ColumnType::Collection(hint) => return check_elements(field, hint, value),
    };

    if ok {
        Ok(())
    } else {
        Err(SchemaError::mismatch(field, ty, value))
    }
}

fn check_elements(field: &str, hint: CollectionHint, value: &Value) -> Result<()> {
    let Some(items) = value.as_array() else {
        return Err(SchemaError::mismatch(field, hint, value));
    };

    for (index, item) in items.iter().enumerate() {
        match hint.element {
            ElementShape::Scalar(kind) => {
                if !kind.matches(item) {
                    return Err(SchemaError::mismatch(format!("{field}[{index}]"), kind, item));
                }
            }
            ElementShape::Entity(entity) => {
                if !item.is_object() {
                    return Err(SchemaError::mismatch(
                        format!("{field}[{index}]"),
                        format!("{entity} sub-document"),
                        item,
                    ));
                }
            }
            ElementShape::Tuple(kinds) => check_tuple(field, index, kinds, item)?,
        }
    }

    Ok(())
}

fn check_tuple(
    field: &str,
    index: usize,
    kinds: &'static [crate::hint::ScalarKind],
    item: &Value,
) -> Result<()> {
    let expected = format!("{}-element sequence", kinds.len());
    let Some(parts) = item.as_array() else {
        return Err(SchemaError::mismatch(
            format!("{field}[{index}]"),
            expected,
            item,
        ));
    };
    if parts.len() != kinds.len() {
        return Err(SchemaError::TypeMismatch {
            field: format!("{field}[{index}]"),
            expected,
            got: format!("{}-element sequence", parts.len()),
        });
    }
    for (position, (kind, part)) in kinds.iter().zip(parts).enumerate() {
        if !kind.matches(part) {
            return Err(SchemaError::mismatch(
                format!("{field}[{index}][{position}]"),
                *kind,
                part,
            ));
        }
    }
    Ok(())
}

/// Read-only, default-filling view over one entity's document fields.
///
/// Handed to [`Persisted::decode_fields`]; every accessor coerces the
/// named field's primitive value to its declared type, consulting the
/// schema default when the document does not carry the key.
pub struct FieldReader<'a> {
    schema: &'static Schema,
    fields: &'a Map<String, Value>,
}

impl FieldReader<'_> {
    fn value(&self, name: &str) -> Result<Value> {
        let column = self
            .schema
            .column(name)
            .ok_or_else(|| SchemaError::UnknownColumn {
                entity: self.schema.entity,
                field: name.to_string(),
            })?;

        Ok(self
            .fields
            .get(name)
            .cloned()
            .unwrap_or_else(|| column.default_value()))
    }

    /// Read a text field.
    ///
    /// # Errors
    ///
    /// Returns a type-mismatch error if the value is not a string.
    pub fn text(&self, name: &str) -> Result<String> {
        match self.value(name)? {
            Value::String(text) => Ok(text),
            other => Err(SchemaError::mismatch(name, "string", &other)),
        }
    }

    /// Read an integer field.
    ///
    /// # Errors
    ///
    /// Returns a type-mismatch error if the value is not an integer.
    pub fn integer(&self, name: &str) -> Result<i64> {
        let value = self.value(name)?;
        value
            .as_i64()
            .ok_or_else(|| SchemaError::mismatch(name, "integer", &value))
    }

    /// Read a nullable integer field.
    ///
    /// # Errors
    ///
    /// Returns a type-mismatch error if the value is neither null nor an
    /// integer.
    pub fn optional_integer(&self, name: &str) -> Result<Option<i64>> {
        let value = self.value(name)?;
        if value.is_null() {
            return Ok(None);
        }
        value
            .as_i64()
            .map(Some)
            .ok_or_else(|| SchemaError::mismatch(name, "integer", &value))
    }

    /// Read a boolean field.
    ///
    /// # Errors
    ///
    /// Returns a type-mismatch error if the value is not a boolean.
    pub fn boolean(&self, name: &str) -> Result<bool> {
        let value = self.value(name)?;
        value
            .as_bool()
            .ok_or_else(|| SchemaError::mismatch(name, "boolean", &value))
    }

    /// Read a timestamp field carried as whole seconds past the epoch.
    ///
    /// # Errors
    ///
    /// Returns a type-mismatch error if the value is not an integer or is
    /// outside the representable instant range.
    pub fn timestamp(&self, name: &str) -> Result<DateTime<Utc>> {
        let seconds = self.integer(name)?;
        DateTime::from_timestamp(seconds, 0).ok_or_else(|| SchemaError::TypeMismatch {
            field: name.to_string(),
            expected: "timestamp".to_string(),
            got: "out-of-range integer".to_string(),
        })
    }

    /// Read an enum field by its canonical wire name.
    ///
    /// # Errors
    ///
    /// Returns a type-mismatch error if the value is not a string or names
    /// no member of the enumeration.
    pub fn wire_enum<E: WireEnum>(&self, name: &str) -> Result<E> {
        let text = self.text(name)?;
        E::from_wire(&text).ok_or_else(|| SchemaError::TypeMismatch {
            field: name.to_string(),
            expected: E::EXPECTED.to_string(),
            got: format!("{text:?}"),
        })
    }

    /// Read a nested entity field.
    ///
    /// # Errors
    ///
    /// Returns a type-mismatch error if the value is not a mapping, or a
    /// decode error from the nested entity's schema.
    pub fn entity<T: Persisted>(&self, name: &str) -> Result<T> {
        let value = self.value(name)?;
        if !value.is_object() {
            return Err(SchemaError::mismatch(
                name,
                format!("{} sub-document", T::ENTITY),
                &value,
            ));
        }
        decode(&value)
    }

    /// Read a polymorphic (discriminator-tagged) field.
    ///
    /// # Errors
    ///
    /// Returns a type-mismatch error if the value is not a mapping, or a
    /// discriminator/decode error from [`decode_poly`].
    pub fn poly<T: Polymorphic>(&self, name: &str) -> Result<T> {
        let value = self.value(name)?;
        if !value.is_object() {
            return Err(SchemaError::mismatch(name, "tagged sub-document", &value));
        }
        decode_poly(&value)
    }

    /// Read a collection of strings.
    ///
    /// # Errors
    ///
    /// Returns a type-mismatch error naming the offending element if the
    /// value is not a sequence of strings.
    pub fn texts(&self, name: &str) -> Result<Vec<String>> {
        let value = self.value(name)?;
        let Some(items) = value.as_array() else {
            return Err(SchemaError::mismatch(name, "sequence of string", &value));
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(text) => Ok(text.clone()),
                other => Err(SchemaError::mismatch(
                    format!("{name}[{index}]"),
                    "string",
                    other,
                )),
            })
            .collect()
    }

    /// Read a collection of nested entities.
    ///
    /// # Errors
    ///
    /// Returns a type-mismatch error naming the offending element, or a
    /// decode error from the element entity's schema.
    pub fn entities<T: Persisted>(&self, name: &str) -> Result<Vec<T>> {
        let value = self.value(name)?;
        let Some(items) = value.as_array() else {
            return Err(SchemaError::mismatch(
                name,
                format!("sequence of {} sub-document", T::ENTITY),
                &value,
            ));
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                if item.is_object() {
                    decode(item)
                } else {
                    Err(SchemaError::mismatch(
                        format!("{name}[{index}]"),
                        format!("{} sub-document", T::ENTITY),
                        item,
                    ))
                }
            })
            .collect()
    }

    /// Read a collection of 2-element string tuples.
    ///
    /// # Errors
    ///
    /// Returns a type-mismatch error naming the offending element if an
    /// element is not a 2-element sequence of strings.
    pub fn string_pairs(&self, name: &str) -> Result<Vec<(String, String)>> {
        let value = self.value(name)?;
        let Some(items) = value.as_array() else {
            return Err(SchemaError::mismatch(
                name,
                "sequence of 2-element sequence",
                &value,
            ));
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let path = || format!("{name}[{index}]");
                let parts = item
                    .as_array()
                    .ok_or_else(|| SchemaError::mismatch(path(), "2-element sequence", item))?;
                match parts.as_slice() {
                    [Value::String(first), Value::String(second)] => {
                        Ok((first.clone(), second.clone()))
                    }
                    _ => Err(SchemaError::mismatch(
                        path(),
                        "2-element sequence of string",
                        item,
                    )),
                }
            })
            .collect()
    }
}
