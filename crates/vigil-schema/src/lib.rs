//! Schema descriptors and the document serialization engine for vigil.
//!
//! This crate converts graphs of strongly-typed domain values into
//! primitive, storage-ready documents (`serde_json::Value` mappings and
//! sequences of strings, numbers, booleans, and null) and back, without
//! losing type fidelity or silently coercing invalid data.
//!
//! The pieces:
//!
//! - [`Schema`] / [`Column`]: a static, per-entity table naming each
//!   persisted field, its declared type, its default, and its constraints
//! - [`CollectionHint`]: the element shape of a homogeneous sequence
//!   field, so empty collections stay decodable
//! - [`Constraint`]: validation predicates checked before encoding
//! - [`Persisted`], [`encode`], [`decode`]: the bidirectional engine
//! - [`Polymorphic`]: discriminator-tagged unions
//! - [`WireEnum`]: closed enumerations with canonical lowercase wire names
//!
//! Schema tables are immutable statics; every encode and decode call is
//! independent and reentrant, so tables can be shared freely across
//! threads.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod column;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod hint;

pub use column::{Column, ColumnDefault, ColumnType, Schema};
pub use constraint::Constraint;
pub use engine::{
    decode, decode_poly, encode, encode_list, encode_poly, pairs_value, shape_name,
    timestamp_value, FieldReader, Persisted, Polymorphic, WireEnum,
};
pub use error::{Result, SchemaError};
pub use hint::{CollectionHint, ElementShape, ScalarKind};
