//! Construction macros for documents and filters.
//!
//! # Examples
//!
//! ```rust
//! use tessera_query::{and_filter, doc, filter, or_filter};
//! use tessera_query::{Filter, Value};
//!
//! let user = doc! {
//!     "id" => "u1",
//!     "address" => doc! { "street" => "555 Candy Cane Lane" },
//! };
//! assert_eq!(user.get_path("address.street"), &Value::from("555 Candy Cane Lane"));
//!
//! // Multiple conditions with AND
//! let f = and_filter!(filter!(active == true), filter!(score > 100));
//! assert!(matches!(f, Filter::And(_)));
//!
//! // Multiple conditions with OR
//! let f = or_filter!(filter!(status == "pending"), filter!(status == "processing"));
//! assert!(matches!(f, Filter::Or(_)));
//! ```

/// Build a [`Document`](crate::Document) from `key => value` pairs.
///
/// Values go through `Value::from`, so nested `doc!` calls, strings,
/// numbers and vectors can be mixed freely. An `Unset` value leaves the
/// field out.
#[macro_export]
macro_rules! doc {
    () => {
        $crate::Document::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut doc = $crate::Document::new();
        $(
            doc.insert($key, $crate::Value::from($value));
        )+
        doc
    }};
}

/// Create a field filter from an operator expression.
///
/// # Syntax
///
/// - `filter!(field == value)` - Equality
/// - `filter!(field != value)` - Not equals
/// - `filter!(field > value)` - Greater than
/// - `filter!(field >= value)` - Greater than or equal
/// - `filter!(field < value)` - Less than
/// - `filter!(field <= value)` - Less than or equal
/// - `filter!(field is null)` - Present and null
/// - `filter!(field is set)` / `filter!(field is unset)` - Presence
/// - `filter!(field contains value)` - Substring
/// - `filter!(field starts_with value)` - Prefix
/// - `filter!(field ends_with value)` - Suffix
/// - `filter!(field in [v1, v2, ...])` - Membership
/// - `filter!(field not in [v1, v2, ...])` - Non-membership
///
/// Dotted paths are not identifiers; build those with the
/// [`Filter`](crate::Filter) constructors.
#[macro_export]
macro_rules! filter {
    ($field:ident == $value:expr) => {
        $crate::Filter::eq(stringify!($field), $value)
    };
    ($field:ident != $value:expr) => {
        $crate::Filter::ne(stringify!($field), $value)
    };
    ($field:ident > $value:expr) => {
        $crate::Filter::gt(stringify!($field), $value)
    };
    ($field:ident >= $value:expr) => {
        $crate::Filter::gte(stringify!($field), $value)
    };
    ($field:ident < $value:expr) => {
        $crate::Filter::lt(stringify!($field), $value)
    };
    ($field:ident <= $value:expr) => {
        $crate::Filter::lte(stringify!($field), $value)
    };
    ($field:ident is null) => {
        $crate::Filter::equals(stringify!($field), $crate::Value::Null)
    };
    ($field:ident is set) => {
        $crate::Filter::is_set(stringify!($field), true)
    };
    ($field:ident is unset) => {
        $crate::Filter::is_set(stringify!($field), false)
    };
    ($field:ident contains $value:expr) => {
        $crate::Filter::contains(stringify!($field), $value)
    };
    ($field:ident starts_with $value:expr) => {
        $crate::Filter::starts_with(stringify!($field), $value)
    };
    ($field:ident ends_with $value:expr) => {
        $crate::Filter::ends_with(stringify!($field), $value)
    };
    ($field:ident in [$($value:expr),* $(,)?]) => {
        $crate::Filter::in_list(
            stringify!($field),
            ::std::vec![$($crate::Value::from($value)),*],
        )
    };
    ($field:ident not in [$($value:expr),* $(,)?]) => {
        $crate::Filter::not_in(
            stringify!($field),
            ::std::vec![$($crate::Value::from($value)),*],
        )
    };
}

/// Combine filters with AND.
#[macro_export]
macro_rules! and_filter {
    ($($filter:expr),+ $(,)?) => {
        $crate::Filter::And(::std::vec![$($filter),+])
    };
}

/// Combine filters with OR.
#[macro_export]
macro_rules! or_filter {
    ($($filter:expr),+ $(,)?) => {
        $crate::Filter::Or(::std::vec![$($filter),+])
    };
}

/// Negate a filter.
#[macro_export]
macro_rules! not_filter {
    ($filter:expr) => {
        $crate::Filter::not($filter)
    };
}

#[cfg(test)]
mod tests {
    use crate::filter::{CompareOp, Condition, Filter};
    use crate::value::Value;

    #[test]
    fn test_doc_macro() {
        let d = doc! { "a" => 1, "b" => "x", "gone" => Value::Unset };
        assert_eq!(d.len(), 2);
        assert_eq!(d.get("a"), &Value::Int(1));
        assert!(!d.contains("gone"));
        assert!(doc! {}.is_empty());
    }

    #[test]
    fn test_filter_eq_macro() {
        let f = filter!(id == 42);
        match f {
            Filter::Field(path, Condition::Compare { op, value, .. }) => {
                assert_eq!(path, "id");
                assert_eq!(op, CompareOp::Eq);
                assert_eq!(value, Value::Int(42));
            }
            _ => panic!("Expected Compare filter"),
        }
    }

    #[test]
    fn test_filter_presence_macros() {
        assert_eq!(filter!(address is set), Filter::is_set("address", true));
        assert_eq!(filter!(address is unset), Filter::is_set("address", false));
        assert_eq!(filter!(deleted_at is null), Filter::equals("deleted_at", Value::Null));
    }

    #[test]
    fn test_filter_in_macro() {
        let f = filter!(status in ["active", "pending", "processing"]);
        match f {
            Filter::Field(_, Condition::Compare { op: CompareOp::In, value, .. }) => {
                assert_eq!(value.as_list().map(<[Value]>::len), Some(3));
            }
            _ => panic!("Expected In filter"),
        }
        assert!(matches!(
            filter!(role not in ["admin"]),
            Filter::Field(_, Condition::Compare { op: CompareOp::NotIn, .. })
        ));
    }

    #[test]
    fn test_combinators() {
        let f = and_filter!(
            filter!(active == true),
            or_filter!(filter!(role == "admin"), filter!(role == "moderator")),
            filter!(age >= 18),
        );
        match f {
            Filter::And(children) => {
                assert_eq!(children.len(), 3);
                assert!(matches!(children[1], Filter::Or(_)));
            }
            _ => panic!("Expected And filter"),
        }
        assert!(matches!(not_filter!(filter!(deleted == true)), Filter::Not(_)));
    }
}
