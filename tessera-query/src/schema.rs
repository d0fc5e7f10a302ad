//! Type descriptors for models and composite types.
//!
//! The mutation applicator consults the schema to know which fields may be
//! unset, which hold lists, and which hold nested composite documents.
//!
//! ```rust
//! use tessera_query::schema::{FieldType, ScalarType, Schema, TypeDef, TypeModifier};
//!
//! let schema = Schema::new()
//!     .with_type(
//!         TypeDef::composite("Address")
//!             .field("street", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
//!             .field("zip", FieldType::Scalar(ScalarType::String), TypeModifier::Optional),
//!     )
//!     .with_type(
//!         TypeDef::model("User")
//!             .field("id", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
//!             .field("address", FieldType::Composite("Address".into()), TypeModifier::Optional),
//!     );
//!
//! let user = schema.get("User").unwrap();
//! assert!(user.get_field("address").unwrap().modifier.is_optional());
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Scalar types a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    /// Integer type.
    Int,
    /// Floating point type.
    Float,
    /// String type.
    String,
    /// Boolean type.
    Boolean,
    /// Date and time type.
    DateTime,
    /// Binary type.
    Bytes,
    /// Any JSON-like value.
    Json,
}

impl ScalarType {
    /// Get the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Bytes => "Bytes",
            Self::Json => "Json",
        }
    }

    /// Check whether a concrete value fits this scalar type.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Int, Value::Int(_))
                | (Self::Float, Value::Float(_) | Value::Int(_))
                | (Self::String, Value::String(_))
                | (Self::Boolean, Value::Bool(_))
                | (Self::DateTime, Value::DateTime(_))
                | (Self::Bytes, Value::Bytes(_))
                | (Self::Json, _)
        )
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A field type in the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// A scalar type.
    Scalar(ScalarType),
    /// A nested composite type, by name.
    Composite(SmolStr),
    /// Id of another record.
    Reference,
}

impl FieldType {
    /// Check if this is a composite type.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    /// Get the type name as a string.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Scalar(s) => s.as_str(),
            Self::Composite(name) => name.as_str(),
            Self::Reference => "Reference",
        }
    }
}

/// Modifier for field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TypeModifier {
    /// Required field (no modifier).
    #[default]
    Required,
    /// Optional field (`?` suffix): may be unset, null, or a value.
    Optional,
    /// List field (`[]` suffix).
    List,
}

impl TypeModifier {
    /// Check if the field is optional.
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional)
    }

    /// Check if the field is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List)
    }
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: SmolStr,
    /// Declared type.
    pub field_type: FieldType,
    /// Arity modifier.
    #[serde(default)]
    pub modifier: TypeModifier,
}

impl FieldDef {
    /// Create a field declaration.
    pub fn new(name: impl Into<SmolStr>, field_type: FieldType, modifier: TypeModifier) -> Self {
        Self {
            name: name.into(),
            field_type,
            modifier,
        }
    }

    /// Whether the field must hold a non-null value.
    ///
    /// Lists are required: they may be empty but not unset by a mutation.
    pub fn is_required(&self) -> bool {
        !self.modifier.is_optional()
    }

    /// Check that a single element (or the whole value, for non-lists) fits
    /// the declared type, without descending into composites.
    pub fn accepts_element(&self, value: &Value) -> bool {
        match (&self.field_type, value) {
            (FieldType::Scalar(s), v) => s.accepts(v),
            (FieldType::Composite(_), Value::Document(_)) => true,
            (FieldType::Reference, Value::Reference(_) | Value::String(_) | Value::Int(_)) => true,
            _ => false,
        }
    }
}

/// Whether a type is a stored model or an embedded composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    /// A top-level record stored in a collection.
    Model,
    /// An embedded document without identity.
    Composite,
}

/// A model or composite type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Type name.
    pub name: SmolStr,
    /// Model or composite.
    pub kind: TypeKind,
    /// Fields in declaration order.
    pub fields: IndexMap<SmolStr, FieldDef>,
}

impl TypeDef {
    /// Create an empty model type.
    pub fn model(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Model,
            fields: IndexMap::new(),
        }
    }

    /// Create an empty composite type.
    pub fn composite(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Composite,
            fields: IndexMap::new(),
        }
    }

    /// Declare a field.
    pub fn field(
        mut self,
        name: impl Into<SmolStr>,
        field_type: FieldType,
        modifier: TypeModifier,
    ) -> Self {
        let def = FieldDef::new(name, field_type, modifier);
        self.fields.insert(def.name.clone(), def);
        self
    }

    /// Look up a field declaration.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    /// Iterate over the required fields.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values().filter(|f| f.is_required())
    }
}

/// A set of type declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    types: IndexMap<SmolStr, TypeDef>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type declaration.
    pub fn with_type(mut self, def: TypeDef) -> Self {
        self.types.insert(def.name.clone(), def);
        self
    }

    /// Look up a type.
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Look up a type, failing with `UnknownType`.
    pub fn require(&self, name: &str) -> QueryResult<&TypeDef> {
        self.get(name).ok_or_else(|| QueryError::unknown_type(name))
    }

    /// Iterate over all types.
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// Check that every composite reference names a declared composite type.
    pub fn validate(&self) -> QueryResult<()> {
        for ty in self.types.values() {
            for field in ty.fields.values() {
                if let FieldType::Composite(target) = &field.field_type {
                    match self.get(target) {
                        Some(t) if t.kind == TypeKind::Composite => {}
                        _ => {
                            return Err(QueryError::unknown_type(target.as_str())
                                .with_field(field.name.as_str())
                                .with_help(format!(
                                    "{}.{} refers to a composite type that is not declared",
                                    ty.name, field.name
                                )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> TypeDef {
        TypeDef::composite("Address")
            .field("street", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
            .field("zip", FieldType::Scalar(ScalarType::String), TypeModifier::Optional)
    }

    #[test]
    fn test_type_modifier_required() {
        let tm = TypeModifier::Required;
        assert!(!tm.is_optional());
        assert!(!tm.is_list());
    }

    #[test]
    fn test_list_fields_are_required() {
        let f = FieldDef::new("tags", FieldType::Scalar(ScalarType::String), TypeModifier::List);
        assert!(f.is_required());
        assert!(f.accepts_element(&Value::from("x")));
        assert!(!f.accepts_element(&Value::Int(1)));
    }

    #[test]
    fn test_float_accepts_int() {
        assert!(ScalarType::Float.accepts(&Value::Int(3)));
        assert!(!ScalarType::Int.accepts(&Value::Float(3.0)));
    }

    #[test]
    fn test_required_fields() {
        let names: Vec<_> = address().required_fields().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec![SmolStr::new("street")]);
    }

    #[test]
    fn test_validate_unknown_composite() {
        let schema = Schema::new().with_type(TypeDef::model("User").field(
            "address",
            FieldType::Composite("Address".into()),
            TypeModifier::Optional,
        ));
        let err = schema.validate().unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::UnknownType);

        let schema = schema.with_type(address());
        assert!(schema.validate().is_ok());
    }
}
