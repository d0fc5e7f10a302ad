//! Filter trees for selecting documents and composite list elements.
//!
//! A [`Filter`] combines per-field [`Condition`]s with `And`/`Or`/`Not`.
//! Conditions on composite fields (`Is`, `IsNot`) and on lists (`Every`,
//! `Some`, `None`) carry nested filters whose field paths are relative to the
//! nested document or list element.
//!
//! ```rust
//! use tessera_query::filter::Filter;
//! use tessera_query::collation::Collation;
//!
//! // address is { street: "555 Candy Cane Lane" } (other fields ignored)
//! let by_street = Filter::is("address", Filter::eq("street", "555 Candy Cane Lane"));
//!
//! // some photo has url "2.jpg"
//! let has_photo = Filter::some("photos", Filter::eq("url", "2.jpg"));
//!
//! // name equals "alice" in any case
//! let by_name = Filter::eq("name", "alice").with_collation(Collation::CaseInsensitive);
//!
//! let combined = Filter::and([by_street, has_photo, by_name]);
//! assert!(matches!(combined, Filter::And(ref children) if children.len() == 3));
//! ```

use serde::{Deserialize, Serialize};

use crate::collation::Collation;
use crate::value::Value;

/// Comparison operators for scalar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// In a list of values.
    In,
    /// Not in a list of values.
    NotIn,
    /// String contains.
    Contains,
    /// String starts with.
    StartsWith,
    /// String ends with.
    EndsWith,
}

impl CompareOp {
    /// Operator name as used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "equals",
            Self::Ne => "not",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
        }
    }

    /// Whether the operator compares by ordering.
    pub fn is_ordering(&self) -> bool {
        matches!(self, Self::Lt | Self::Lte | Self::Gt | Self::Gte)
    }

    /// Whether the operator matches substrings.
    pub fn is_substring(&self) -> bool {
        matches!(self, Self::Contains | Self::StartsWith | Self::EndsWith)
    }
}

/// A condition on a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// The field equals the value; composites must match on all fields.
    Equals(Value),
    /// The nested document matches the filter (fields not named are ignored).
    Is(Box<Filter>),
    /// Negation of [`Condition::Is`].
    IsNot(Box<Filter>),
    /// `true`: the field is present (null counts); `false`: the field is unset.
    IsSet(bool),
    /// Every list element matches.
    Every(Box<Filter>),
    /// At least one list element matches.
    Some(Box<Filter>),
    /// No list element matches.
    None(Box<Filter>),
    /// `true`: the list has no elements; `false`: it has at least one.
    IsEmpty(bool),
    /// Scalar comparison with an optional collation override.
    Compare {
        /// Operator.
        op: CompareOp,
        /// Operand.
        value: Value,
        /// Collation for string operands; `None` uses the resolved default.
        collation: Option<Collation>,
    },
}

impl Condition {
    /// Condition name as used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Equals(_) => "equals",
            Self::Is(_) => "is",
            Self::IsNot(_) => "isNot",
            Self::IsSet(_) => "isSet",
            Self::Every(_) => "every",
            Self::Some(_) => "some",
            Self::None(_) => "none",
            Self::IsEmpty(_) => "isEmpty",
            Self::Compare { op, .. } => op.as_str(),
        }
    }
}

/// A complete filter over a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// No filter (always true).
    None,
    /// A condition on the field at a dotted path.
    Field(String, Condition),
    /// Logical AND of multiple filters.
    And(Vec<Filter>),
    /// Logical OR of multiple filters.
    Or(Vec<Filter>),
    /// Logical NOT of a filter.
    Not(Box<Filter>),
}

impl Default for Filter {
    fn default() -> Self {
        Self::None
    }
}

impl Filter {
    /// Create an empty filter (matches everything).
    pub fn none() -> Self {
        Self::None
    }

    /// Check if this filter is empty.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// A condition on a field.
    pub fn field(path: impl Into<String>, condition: Condition) -> Self {
        Self::Field(path.into(), condition)
    }

    /// Full equality, including composites.
    pub fn equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(path, Condition::Equals(value.into()))
    }

    /// The nested document at `path` matches `filter`.
    pub fn is(path: impl Into<String>, filter: Filter) -> Self {
        Self::field(path, Condition::Is(Box::new(filter)))
    }

    /// The nested document at `path` does not match `filter`.
    pub fn is_not(path: impl Into<String>, filter: Filter) -> Self {
        Self::field(path, Condition::IsNot(Box::new(filter)))
    }

    /// The field is present (`true`) or unset (`false`).
    pub fn is_set(path: impl Into<String>, set: bool) -> Self {
        Self::field(path, Condition::IsSet(set))
    }

    /// Every element of the list at `path` matches.
    pub fn every(path: impl Into<String>, filter: Filter) -> Self {
        Self::field(path, Condition::Every(Box::new(filter)))
    }

    /// Some element of the list at `path` matches.
    pub fn some(path: impl Into<String>, filter: Filter) -> Self {
        Self::field(path, Condition::Some(Box::new(filter)))
    }

    /// No element of the list at `path` matches.
    pub fn none_of(path: impl Into<String>, filter: Filter) -> Self {
        Self::field(path, Condition::None(Box::new(filter)))
    }

    /// The list at `path` is empty (`true`) or non-empty (`false`).
    pub fn is_empty_list(path: impl Into<String>, empty: bool) -> Self {
        Self::field(path, Condition::IsEmpty(empty))
    }

    /// Scalar comparison using the resolved default collation.
    pub fn compare(path: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::field(
            path,
            Condition::Compare {
                op,
                value: value.into(),
                collation: None,
            },
        )
    }

    /// Scalar equality.
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Eq, value)
    }

    /// Scalar inequality.
    pub fn ne(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Ne, value)
    }

    /// Less than.
    pub fn lt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Lt, value)
    }

    /// Less than or equal.
    pub fn lte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Lte, value)
    }

    /// Greater than.
    pub fn gt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Gt, value)
    }

    /// Greater than or equal.
    pub fn gte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Gte, value)
    }

    /// Value is one of `values`.
    pub fn in_list<V: Into<Value>>(path: impl Into<String>, values: Vec<V>) -> Self {
        Self::compare(path, CompareOp::In, Value::from(values))
    }

    /// Value is none of `values`.
    pub fn not_in<V: Into<Value>>(path: impl Into<String>, values: Vec<V>) -> Self {
        Self::compare(path, CompareOp::NotIn, Value::from(values))
    }

    /// String contains.
    pub fn contains(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Contains, value)
    }

    /// String starts with.
    pub fn starts_with(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::StartsWith, value)
    }

    /// String ends with.
    pub fn ends_with(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::EndsWith, value)
    }

    /// Set the collation of a comparison leaf.
    ///
    /// Has no effect on other filters; nested filters keep their own leaves.
    pub fn with_collation(mut self, mode: Collation) -> Self {
        if let Self::Field(_, Condition::Compare { collation, .. }) = &mut self {
            *collation = Some(mode);
        }
        self
    }

    /// Shorthand for a case-insensitive comparison leaf.
    pub fn insensitive(self) -> Self {
        self.with_collation(Collation::CaseInsensitive)
    }

    /// Create an AND filter.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.remove(0),
            _ => Self::And(filters),
        }
    }

    /// Create an OR filter.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.remove(0),
            _ => Self::Or(filters),
        }
    }

    /// Create a NOT filter.
    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        if filter.is_none() {
            return Self::None;
        }
        Self::Not(Box::new(filter))
    }

    /// Combine with another filter using AND.
    pub fn and_then(self, other: Filter) -> Self {
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    /// Combine with another filter using OR.
    pub fn or_else(self, other: Filter) -> Self {
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        match self {
            Self::Or(mut filters) => {
                filters.push(other);
                Self::Or(filters)
            }
            _ => Self::Or(vec![self, other]),
        }
    }

    /// Nesting depth of the tree (a leaf is 1).
    pub fn depth(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Field(_, condition) => match condition {
                Condition::Is(f)
                | Condition::IsNot(f)
                | Condition::Every(f)
                | Condition::Some(f)
                | Condition::None(f) => 1 + f.depth(),
                _ => 1,
            },
            Self::And(children) | Self::Or(children) => {
                1 + children.iter().map(Filter::depth).max().unwrap_or(0)
            }
            Self::Not(inner) => 1 + inner.depth(),
        }
    }
}
