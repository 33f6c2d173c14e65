//! Collection element shape descriptors.
//!
//! A collection column carries one of these hints so the engine knows how
//! to recurse into elements at both encode and decode time. The hint is
//! declared explicitly rather than inferred from a populated instance: an
//! empty sequence carries no element to inspect.

use std::fmt;

/// Scalar element kinds a collection can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// UTF-8 text.
    Text,
    /// 64-bit signed integer.
    Integer,
    /// Boolean flag.
    Boolean,
}

impl ScalarKind {
    /// Whether `value` has this scalar shape.
    #[must_use]
    pub fn matches(self, value: &serde_json::Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Integer => value.as_i64().is_some(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// Element shape of a homogeneous collection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementShape {
    /// Plain scalar elements, encoded in place.
    Scalar(ScalarKind),
    /// Sub-documents of the named described entity.
    Entity(&'static str),
    /// Fixed-arity tuples, encoded as fixed-length sequences.
    Tuple(&'static [ScalarKind]),
}

impl fmt::Display for ElementShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Entity(entity) => write!(f, "{entity} sub-document"),
            Self::Tuple(kinds) => write!(f, "{}-element sequence", kinds.len()),
        }
    }
}

/// Describes a field whose value is a homogeneous ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionHint {
    /// Shape of each element.
    pub element: ElementShape,
}

impl CollectionHint {
    /// A collection of scalars.
    #[must_use]
    pub const fn scalar(kind: ScalarKind) -> Self {
        Self {
            element: ElementShape::Scalar(kind),
        }
    }

    /// A collection of sub-documents of the named entity.
    #[must_use]
    pub const fn entity(entity: &'static str) -> Self {
        Self {
            element: ElementShape::Entity(entity),
        }
    }

    /// A collection of fixed-arity tuples.
    #[must_use]
    pub const fn tuple(kinds: &'static [ScalarKind]) -> Self {
        Self {
            element: ElementShape::Tuple(kinds),
        }
    }
}

impl fmt::Display for CollectionHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sequence of {}", self.element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_kinds_match_shapes() {
        assert!(ScalarKind::Text.matches(&json!("hello")));
        assert!(ScalarKind::Integer.matches(&json!(42)));
        assert!(ScalarKind::Boolean.matches(&json!(true)));

        assert!(!ScalarKind::Text.matches(&json!(42)));
        assert!(!ScalarKind::Integer.matches(&json!("42")));
        assert!(!ScalarKind::Integer.matches(&json!(4.2)));
    }

    #[test]
    fn hint_display() {
        let texts = CollectionHint::scalar(ScalarKind::Text);
        assert_eq!(texts.to_string(), "sequence of string");

        let pairs = CollectionHint::tuple(&[ScalarKind::Text, ScalarKind::Text]);
        assert_eq!(pairs.to_string(), "sequence of 2-element sequence");

        let entities = CollectionHint::entity("package_version");
        assert_eq!(entities.to_string(), "sequence of package_version sub-document");
    }
}
