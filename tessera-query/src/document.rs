//! The document model: an ordered mapping from field names to values.
//!
//! ```rust
//! use tessera_query::{doc, Document, Value};
//!
//! let mut user = doc! {
//!     "id" => "u1",
//!     "address" => doc! { "street" => "555 Candy Cane Lane", "city" => "Wonderland" },
//! };
//!
//! assert_eq!(user.get_path("address.city").as_str(), Some("Wonderland"));
//! assert!(user.get("nickname").is_unset());
//!
//! // Writing `Unset` removes the field; `Null` keeps it present.
//! user.insert("nickname", Value::Null);
//! assert!(user.get("nickname").is_null());
//! user.insert("nickname", Value::Unset);
//! assert!(user.get("nickname").is_unset());
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::value::{RecordId, Value};

static UNSET: Value = Value::Unset;

/// A record or nested composite document.
///
/// Field order is insertion order. Equality is structural and does not depend
/// on field order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Look up a field; absent fields are [`Value::Unset`].
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&UNSET)
    }

    /// Look up a dotted path such as `address.street`.
    ///
    /// Traversal through anything other than a nested document yields
    /// [`Value::Unset`].
    pub fn get_path(&self, path: &str) -> &Value {
        let mut segments = path.split('.');
        let first = match segments.next() {
            Some(s) => s,
            None => return &UNSET,
        };
        let mut current = self.get(first);
        for segment in segments {
            current = match current {
                Value::Document(doc) => doc.get(segment),
                _ => return &UNSET,
            };
        }
        current
    }

    /// Set a field. Inserting [`Value::Unset`] removes the field.
    ///
    /// Returns the previous value, if the field was present.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        let field = field.into();
        if value.is_unset() {
            self.fields.shift_remove(&field)
        } else {
            self.fields.insert(field, value)
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value.into());
        self
    }

    /// Remove a field, keeping the order of the remaining ones.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    /// Check if a field is present (including explicit null).
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of present fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Extract the record id stored under `id_field`.
    ///
    /// String, integer and reference values are accepted.
    pub fn record_id(&self, id_field: &str) -> Option<RecordId> {
        match self.get(id_field) {
            Value::String(s) => Some(RecordId::from(s.as_str())),
            Value::Int(i) => Some(RecordId::from(*i)),
            Value::Reference(id) => Some(id.clone()),
            _ => None,
        }
    }

    /// Build a document from a JSON object.
    pub fn from_json(json: serde_json::Value) -> QueryResult<Self> {
        match Value::from(json) {
            Value::Document(doc) => Ok(doc),
            other => Err(QueryError::invalid_data_type(
                "<root>",
                "object",
                other.type_name(),
            )),
        }
    }

    /// Convert the document to JSON.
    pub fn to_json(&self) -> QueryResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| QueryError::internal(e.to_string()).with_source(e))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_insert_unset_removes_field() {
        let mut d = doc! { "a" => 1, "b" => 2 };
        let prev = d.insert("a", Value::Unset);
        assert_eq!(prev, Some(Value::Int(1)));
        assert!(!d.contains("a"));
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_null_is_present() {
        let d = doc! { "a" => Value::Null };
        assert!(d.contains("a"));
        assert!(d.get("a").is_null());
    }

    #[test]
    fn test_equality_ignores_field_order() {
        let a = doc! { "x" => 1, "y" => "two" };
        let b = doc! { "y" => "two", "x" => 1 };
        assert_eq!(a, b);
        assert_ne!(a, doc! { "x" => 1 });
    }

    #[test]
    fn test_get_path_through_scalar_is_unset() {
        let d = doc! { "address" => doc! { "zip" => "52337" }, "name" => "Alice" };
        assert_eq!(d.get_path("address.zip").as_str(), Some("52337"));
        assert!(d.get_path("name.first").is_unset());
        assert!(d.get_path("address.street").is_unset());
    }

    #[test]
    fn test_record_id_variants() {
        assert_eq!(doc! { "id" => "a1" }.record_id("id"), Some(RecordId::from("a1")));
        assert_eq!(doc! { "id" => 7 }.record_id("id"), Some(RecordId::from(7)));
        assert_eq!(doc! { "id" => 1.5 }.record_id("id"), None);
        assert_eq!(doc! {}.record_id("id"), None);
    }

    #[test]
    fn test_json_roundtrip_keeps_nulls() {
        let d = doc! { "name" => "Alice", "bio" => Value::Null, "age" => 30 };
        let json = d.to_json().unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Alice", "bio": null, "age": 30 }));
        assert_eq!(Document::from_json(json).unwrap(), d);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = Document::from_json(serde_json::json!([1, 2])).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::InvalidDataType);
    }
}
