//! Field validation constraints.
//!
//! Constraints are evaluated against the primitive value of a field just
//! before it is written into a document; a failing constraint surfaces as
//! a validation error naming the field and the rule, never as silently
//! dropped data.

use serde_json::Value;

/// A validation predicate attached to a schema column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// The value must be a non-empty string.
    NotEmpty,
    /// The value must be one of the listed strings.
    OneOf(&'static [&'static str]),
    /// The value must be an integer greater than or equal to zero.
    NonNegative,
}

impl Constraint {
    /// The rule text reported when this constraint fails.
    #[must_use]
    pub const fn rule(&self) -> &'static str {
        match self {
            Self::NotEmpty => "value must be a non-empty string",
            Self::OneOf(_) => "value must be one of the allowed set",
            Self::NonNegative => "value must be a non-negative integer",
        }
    }

    /// Whether `value` satisfies this constraint.
    #[must_use]
    pub fn holds(&self, value: &Value) -> bool {
        match self {
            Self::NotEmpty => value.as_str().is_some_and(|s| !s.is_empty()),
            Self::OneOf(allowed) => value.as_str().is_some_and(|s| allowed.contains(&s)),
            Self::NonNegative => value.as_i64().is_some_and(|n| n >= 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn not_empty() {
        assert!(Constraint::NotEmpty.holds(&json!("x")));
        assert!(!Constraint::NotEmpty.holds(&json!("")));
        assert!(!Constraint::NotEmpty.holds(&json!(7)));
    }

    #[test]
    fn one_of() {
        let constraint = Constraint::OneOf(&["running", "terminated"]);
        assert!(constraint.holds(&json!("running")));
        assert!(!constraint.holds(&json!("paused")));
        assert!(!constraint.holds(&json!(null)));
    }

    #[test]
    fn non_negative() {
        assert!(Constraint::NonNegative.holds(&json!(0)));
        assert!(Constraint::NonNegative.holds(&json!(120)));
        assert!(!Constraint::NonNegative.holds(&json!(-1)));
        assert!(!Constraint::NonNegative.holds(&json!("5")));
    }
}
