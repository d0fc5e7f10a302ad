//! Common types used in operations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::collation::Collation;
use crate::document::Document;

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9, oldest first).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0, newest first).
    Desc,
}

impl SortOrder {
    /// Get the keyword for this sort order.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Placement of unset and null values when sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullsOrder {
    /// Nulls appear first in the results.
    First,
    /// Nulls appear last in the results.
    Last,
}

/// Order by specification for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByField {
    /// Dotted path of the field to order by.
    pub path: String,
    /// The sort order.
    #[serde(default)]
    pub order: SortOrder,
    /// Null handling; defaults to first when ascending, last when descending.
    #[serde(default)]
    pub nulls: Option<NullsOrder>,
    /// Collation for string values; `None` uses the resolved default.
    #[serde(default)]
    pub collation: Option<Collation>,
}

impl OrderByField {
    /// Create a new order by field.
    pub fn new(path: impl Into<String>, order: SortOrder) -> Self {
        Self {
            path: path.into(),
            order,
            nulls: None,
            collation: None,
        }
    }

    /// Create an ascending order.
    pub fn asc(path: impl Into<String>) -> Self {
        Self::new(path, SortOrder::Asc)
    }

    /// Create a descending order.
    pub fn desc(path: impl Into<String>) -> Self {
        Self::new(path, SortOrder::Desc)
    }

    /// Set null handling.
    pub fn nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = Some(nulls);
        self
    }

    /// Set the collation used for string values.
    pub fn with_collation(mut self, collation: Collation) -> Self {
        self.collation = Some(collation);
        self
    }

    /// Effective placement of unset and null values.
    pub fn effective_nulls(&self) -> NullsOrder {
        match (self.nulls, self.order) {
            (Some(n), _) => n,
            (None, SortOrder::Asc) => NullsOrder::First,
            (None, SortOrder::Desc) => NullsOrder::Last,
        }
    }
}

impl fmt::Display for OrderByField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.order)
    }
}

/// Order by specification that can be a single field or multiple fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderBy {
    /// Order by a single field.
    Field(OrderByField),
    /// Order by multiple fields, highest priority first.
    Fields(Vec<OrderByField>),
}

impl Default for OrderBy {
    fn default() -> Self {
        Self::none()
    }
}

impl OrderBy {
    /// Create an empty order by (no ordering).
    pub fn none() -> Self {
        Self::Fields(Vec::new())
    }

    /// Check if the order by is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Field(_) => false,
            Self::Fields(fields) => fields.is_empty(),
        }
    }

    /// Add a lower-priority field to the order by.
    pub fn then(self, field: OrderByField) -> Self {
        match self {
            Self::Field(existing) => Self::Fields(vec![existing, field]),
            Self::Fields(mut existing) => {
                if existing.is_empty() {
                    return Self::Field(field);
                }
                existing.push(field);
                Self::Fields(existing)
            }
        }
    }

    /// Create an OrderBy from multiple fields.
    pub fn from_fields(fields: impl IntoIterator<Item = OrderByField>) -> Self {
        let mut fields: Vec<_> = fields.into_iter().collect();
        match fields.len() {
            1 => Self::Field(fields.remove(0)),
            _ => Self::Fields(fields),
        }
    }

    /// The fields in priority order.
    pub fn fields(&self) -> &[OrderByField] {
        match self {
            Self::Field(field) => std::slice::from_ref(field),
            Self::Fields(fields) => fields,
        }
    }
}

impl From<OrderByField> for OrderBy {
    fn from(field: OrderByField) -> Self {
        Self::Field(field)
    }
}

impl From<Vec<OrderByField>> for OrderBy {
    fn from(fields: Vec<OrderByField>) -> Self {
        Self::from_fields(fields)
    }
}

/// Field projection for returned documents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Select {
    /// Return every field.
    #[default]
    All,
    /// Return only the named top-level fields, in the given order.
    Fields(Vec<String>),
}

impl Select {
    /// Select all fields.
    pub fn all() -> Self {
        Self::All
    }

    /// Select specific fields.
    pub fn fields(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Fields(fields.into_iter().map(Into::into).collect())
    }

    /// Check if this selects all fields.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Project a document. Unset fields stay unset.
    pub fn apply(&self, doc: Document) -> Document {
        match self {
            Self::All => doc,
            Self::Fields(names) => {
                let mut out = Document::with_capacity(names.len());
                for name in names {
                    let value = doc.get(name);
                    if !value.is_unset() {
                        out.insert(name.clone(), value.clone());
                    }
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::value::Value;

    #[test]
    fn test_sort_order() {
        assert_eq!(SortOrder::Asc.as_str(), "asc");
        assert_eq!(SortOrder::Desc.to_string(), "desc");
        assert_eq!(SortOrder::default(), SortOrder::Asc);
    }

    #[test]
    fn test_effective_nulls() {
        assert_eq!(OrderByField::asc("a").effective_nulls(), NullsOrder::First);
        assert_eq!(OrderByField::desc("a").effective_nulls(), NullsOrder::Last);
        assert_eq!(
            OrderByField::desc("a").nulls(NullsOrder::First).effective_nulls(),
            NullsOrder::First
        );
    }

    #[test]
    fn test_order_by_then() {
        let order = OrderBy::none()
            .then(OrderByField::asc("name"))
            .then(OrderByField::desc("created_at"));
        let paths: Vec<_> = order.fields().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "created_at"]);
    }

    #[test]
    fn test_order_by_from_fields() {
        assert!(OrderBy::from_fields([]).is_empty());
        assert!(matches!(
            OrderBy::from_fields([OrderByField::asc("a")]),
            OrderBy::Field(_)
        ));
    }

    #[test]
    fn test_select_apply() {
        let d = doc! { "id" => "1", "name" => "Alice", "bio" => Value::Null };
        let projected = Select::fields(["name", "bio", "missing"]).apply(d.clone());
        assert_eq!(projected, doc! { "name" => "Alice", "bio" => Value::Null });
        assert_eq!(Select::all().apply(d.clone()), d);
    }
}
