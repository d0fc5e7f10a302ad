//! Field values held by documents and used as filter operands.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::document::Document;

/// Identity of a top-level record.
///
/// Nested documents have no identity of their own; only records stored in a
/// collection carry a `RecordId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(SmolStr);

impl RecordId {
    /// Create a record id from anything string-like.
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(v: &str) -> Self {
        Self(SmolStr::new(v))
    }
}

impl From<String> for RecordId {
    fn from(v: String) -> Self {
        Self(SmolStr::new(v))
    }
}

impl From<i64> for RecordId {
    fn from(v: i64) -> Self {
        Self(SmolStr::new(v.to_string()))
    }
}

/// A value stored in a document field.
///
/// `Unset` and `Null` are distinct: `Unset` means the field is absent, `Null`
/// means it is present and explicitly null. A [`Document`] never stores
/// `Unset`; it is what lookups of absent fields return and what a mutation
/// produces to remove a field.
///
/// Serialized forms follow JSON where JSON has a matching type. Dates,
/// binary data and references use single-key tagged objects (`{"$date": ..}`,
/// `{"$binary": [..]}`, `{"$ref": ..}`) so they read back as the same variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Field is absent.
    #[serde(skip)]
    Unset,
    /// Explicit null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// Date-time value.
    DateTime(#[serde(with = "tagged::date")] DateTime<Utc>),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Binary value.
    Bytes(#[serde(with = "tagged::binary")] Vec<u8>),
    /// Id of another record; no ownership implied.
    Reference(#[serde(with = "tagged::reference")] RecordId),
    // Must stay after the tagged variants: untagged deserialization takes
    // the first match and any object is a valid document.
    /// Nested composite document.
    Document(Document),
}

impl Value {
    /// Name of the value's kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::DateTime(_) => "datetime",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Document(_) => "document",
            Self::Reference(_) => "reference",
        }
    }

    /// Check if the field is absent.
    #[inline]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Check if this is an explicit null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if the field is unset or null.
    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Unset | Self::Null)
    }

    /// Check if this is a scalar (neither list, document, null nor unset).
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Self::Unset | Self::Null | Self::List(_) | Self::Document(_)
        )
    }

    /// Get the string value, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer value, if any.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get a numeric value as `f64` (ints are widened).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the boolean value, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the list, if any.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the nested document, if any.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(doc) => Some(doc),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Self::Document(v)
    }
}

impl From<RecordId> for Value {
    fn from(v: RecordId) -> Self {
        Self::Reference(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => match tagged::from_json(&map) {
                Some(value) => value,
                None => Self::Document(
                    map.into_iter()
                        .map(|(k, v)| (k, Value::from(v)))
                        .collect(),
                ),
            },
        }
    }
}

// Single-key object forms for variants JSON has no type for.
mod tagged {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{RecordId, Value};

    const DATE: &str = "$date";
    const BINARY: &str = "$binary";
    const REFERENCE: &str = "$ref";

    pub(super) fn from_json(map: &serde_json::Map<String, serde_json::Value>) -> Option<Value> {
        if map.len() != 1 {
            return None;
        }
        let (key, value) = map.iter().next()?;
        match (key.as_str(), value) {
            (DATE, serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|d| Value::DateTime(d.with_timezone(&Utc))),
            (REFERENCE, serde_json::Value::String(s)) => {
                Some(Value::Reference(RecordId::from(s.as_str())))
            }
            (BINARY, serde_json::Value::Array(items)) => items
                .iter()
                .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .map(Value::Bytes),
            _ => None,
        }
    }

    pub mod date {
        use super::*;

        #[derive(Serialize, Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Tagged {
            #[serde(rename = "$date")]
            date: DateTime<Utc>,
        }

        pub fn serialize<S: Serializer>(date: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
            Tagged { date: *date }.serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
            Ok(Tagged::deserialize(d)?.date)
        }
    }

    pub mod binary {
        use super::*;

        #[derive(Serialize)]
        struct TaggedRef<'a> {
            #[serde(rename = "$binary")]
            bytes: &'a [u8],
        }

        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Tagged {
            #[serde(rename = "$binary")]
            bytes: Vec<u8>,
        }

        pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
            TaggedRef { bytes }.serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
            Ok(Tagged::deserialize(d)?.bytes)
        }
    }

    pub mod reference {
        use super::*;

        #[derive(Serialize)]
        struct TaggedRef<'a> {
            #[serde(rename = "$ref")]
            id: &'a RecordId,
        }

        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Tagged {
            #[serde(rename = "$ref")]
            id: RecordId,
        }

        pub fn serialize<S: Serializer>(id: &RecordId, s: S) -> Result<S::Ok, S::Error> {
            TaggedRef { id }.serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<RecordId, D::Error> {
            Ok(Tagged::deserialize(d)?.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_is_not_null() {
        assert!(Value::Unset.is_unset());
        assert!(!Value::Unset.is_null());
        assert!(Value::Null.is_null());
        assert!(!Value::Null.is_unset());
        assert!(Value::Unset.is_absent() && Value::Null.is_absent());
        assert_ne!(Value::Unset, Value::Null);
    }

    #[test]
    fn test_option_none_becomes_null() {
        let v: Value = Option::<i64>::None.into();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::String("3".into()).as_f64(), None);
    }

    #[test]
    fn test_from_json_nested() {
        let json = serde_json::json!({
            "street": "555 Candy Cane Lane",
            "zip": 52337,
            "tags": ["a", "b"],
            "geo": null
        });
        let value = Value::from(json);
        let doc = value.as_document().unwrap();
        assert_eq!(doc.get("street").as_str(), Some("555 Candy Cane Lane"));
        assert_eq!(doc.get("zip").as_i64(), Some(52337));
        assert_eq!(doc.get("tags").as_list().map(|l| l.len()), Some(2));
        assert!(doc.get("geo").is_null());
        assert!(doc.get("missing").is_unset());
    }

    #[test]
    fn test_tagged_variants_keep_their_kind() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let values = vec![
            Value::DateTime(at),
            Value::Bytes(vec![0, 7, 255]),
            Value::Reference(RecordId::from("u1")),
        ];

        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "$date": "2024-05-01T12:00:00Z" },
                { "$binary": [0, 7, 255] },
                { "$ref": "u1" },
            ])
        );

        let back: Vec<Value> = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, values);
        assert_eq!(Value::from(json), Value::List(values));
    }

    #[test]
    fn test_tag_lookalikes_stay_documents() {
        let json = serde_json::json!({ "$date": "not a date" });
        assert!(matches!(Value::from(json.clone()), Value::Document(_)));
        let back: Value = serde_json::from_value(json).unwrap();
        assert!(matches!(back, Value::Document(_)));

        let json = serde_json::json!({ "$ref": "u1", "extra": 1 });
        assert!(matches!(Value::from(json), Value::Document(_)));
    }

    #[test]
    fn test_record_id_from_int() {
        assert_eq!(RecordId::from(42).as_str(), "42");
        assert_eq!(RecordId::from("abc").to_string(), "abc");
    }
}
