//! Structured mutations and the applicator that computes updated documents.
//!
//! An [`UpdateData`] maps field names to [`Mutation`]s in declaration order.
//! The [`Applicator`] applies it to a base document (or to nothing, when
//! creating a record) and returns a new document; the input is never changed.
//!
//! ```rust
//! use tessera_query::{doc, Applicator, Collation, Filter, UpdateData, Value};
//! use tessera_query::schema::{FieldType, ScalarType, Schema, TypeDef, TypeModifier};
//!
//! let schema = Schema::new()
//!     .with_type(
//!         TypeDef::composite("Photo")
//!             .field("url", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
//!             .field("height", FieldType::Scalar(ScalarType::Int), TypeModifier::Required),
//!     )
//!     .with_type(
//!         TypeDef::model("Product")
//!             .field("id", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
//!             .field("photos", FieldType::Composite("Photo".into()), TypeModifier::List),
//!     );
//!
//! let product = doc! {
//!     "id" => "p1",
//!     "photos" => vec![
//!         Value::from(doc! { "height" => 100, "url" => "a" }),
//!         Value::from(doc! { "height" => 200, "url" => "b" }),
//!     ],
//! };
//!
//! let data = UpdateData::new().delete_many("photos", Filter::eq("height", 100));
//! let updated = Applicator::new(&schema, &Collation::CaseSensitive)
//!     .apply(Some(&product), "Product", &data)
//!     .unwrap();
//!
//! assert_eq!(
//!     updated.get("photos"),
//!     &Value::from(vec![doc! { "height" => 200, "url" => "b" }])
//! );
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::collation::CollationResolver;
use crate::document::Document;
use crate::error::{QueryError, QueryResult};
use crate::eval::Evaluator;
use crate::filter::Filter;
use crate::schema::{FieldDef, FieldType, ScalarType, Schema, TypeDef, TypeModifier};
use crate::value::Value;

/// Atomic number operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericOp {
    /// Add the operand.
    Increment,
    /// Subtract the operand.
    Decrement,
    /// Multiply by the operand.
    Multiply,
    /// Divide by the operand.
    Divide,
}

impl NumericOp {
    /// Operation name as used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }
}

/// A mutation of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Replace the field's value, whatever it held before.
    Set(Value),
    /// Remove the field. Only legal on optional fields.
    Unset,
    /// Merge field mutations into the nested document.
    Update(UpdateData),
    /// `Set(set)` when the field is unset or null, `Update(update)` otherwise.
    Upsert {
        /// Value written when the field is absent.
        set: Value,
        /// Mutations merged when the field holds a document.
        update: UpdateData,
    },
    /// Append values to a list field.
    Push(Vec<Value>),
    /// Update every element of a composite list that matches the filter.
    UpdateMany {
        /// Element filter.
        filter: Filter,
        /// Mutations applied to each matching element.
        update: UpdateData,
    },
    /// Remove every element of a composite list that matches the filter.
    DeleteMany(Filter),
    /// Arithmetic on a numeric field.
    Numeric(NumericOp, Value),
}

impl Mutation {
    /// Replace the field's value.
    pub fn set(value: impl Into<Value>) -> Self {
        Self::Set(value.into())
    }

    /// Create-or-update combinator.
    pub fn upsert(set: impl Into<Value>, update: UpdateData) -> Self {
        Self::Upsert {
            set: set.into(),
            update,
        }
    }

    /// Mutation name as used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Set(_) => "set",
            Self::Unset => "unset",
            Self::Update(_) => "update",
            Self::Upsert { .. } => "upsert",
            Self::Push(_) => "push",
            Self::UpdateMany { .. } => "updateMany",
            Self::DeleteMany(_) => "deleteMany",
            Self::Numeric(op, _) => op.as_str(),
        }
    }
}

/// Ordered field mutations for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateData {
    fields: IndexMap<String, Mutation>,
}

impl UpdateData {
    /// Create empty update data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mutation for a field. A later mutation for the same field
    /// replaces the earlier one but keeps its position.
    pub fn field(mut self, name: impl Into<String>, mutation: Mutation) -> Self {
        self.fields.insert(name.into(), mutation);
        self
    }

    /// Set a field.
    pub fn set(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(name, Mutation::set(value))
    }

    /// Unset a field.
    pub fn unset(self, name: impl Into<String>) -> Self {
        self.field(name, Mutation::Unset)
    }

    /// Update a nested document.
    pub fn update(self, name: impl Into<String>, data: UpdateData) -> Self {
        self.field(name, Mutation::Update(data))
    }

    /// Upsert a nested document.
    pub fn upsert(self, name: impl Into<String>, set: impl Into<Value>, update: UpdateData) -> Self {
        self.field(name, Mutation::upsert(set, update))
    }

    /// Append values to a list.
    pub fn push<V: Into<Value>>(self, name: impl Into<String>, values: Vec<V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.field(name, Mutation::Push(values))
    }

    /// Update matching elements of a composite list.
    pub fn update_many(self, name: impl Into<String>, filter: Filter, update: UpdateData) -> Self {
        self.field(name, Mutation::UpdateMany { filter, update })
    }

    /// Delete matching elements of a composite list.
    pub fn delete_many(self, name: impl Into<String>, filter: Filter) -> Self {
        self.field(name, Mutation::DeleteMany(filter))
    }

    /// Increment a numeric field.
    pub fn increment(self, name: impl Into<String>, by: impl Into<Value>) -> Self {
        self.field(name, Mutation::Numeric(NumericOp::Increment, by.into()))
    }

    /// Decrement a numeric field.
    pub fn decrement(self, name: impl Into<String>, by: impl Into<Value>) -> Self {
        self.field(name, Mutation::Numeric(NumericOp::Decrement, by.into()))
    }

    /// Multiply a numeric field.
    pub fn multiply(self, name: impl Into<String>, by: impl Into<Value>) -> Self {
        self.field(name, Mutation::Numeric(NumericOp::Multiply, by.into()))
    }

    /// Divide a numeric field.
    pub fn divide(self, name: impl Into<String>, by: impl Into<Value>) -> Self {
        self.field(name, Mutation::Numeric(NumericOp::Divide, by.into()))
    }

    /// Look up the mutation for a field.
    pub fn get(&self, name: &str) -> Option<&Mutation> {
        self.fields.get(name)
    }

    /// Iterate over field mutations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Mutation)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of field mutations.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if there are no mutations.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Turn a plain document into `Set` mutations, one per field.
    pub fn from_document(doc: Document) -> Self {
        doc.into_iter()
            .fold(Self::new(), |data, (k, v)| data.field(k, Mutation::Set(v)))
    }
}

impl From<Document> for UpdateData {
    fn from(doc: Document) -> Self {
        Self::from_document(doc)
    }
}

/// Applies [`UpdateData`] to documents of a schema type.
#[derive(Clone, Copy)]
pub struct Applicator<'a> {
    schema: &'a Schema,
    evaluator: Evaluator<'a>,
}

impl std::fmt::Debug for Applicator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Applicator").finish_non_exhaustive()
    }
}

impl<'a> Applicator<'a> {
    /// Create an applicator. The resolver is used by list element filters.
    pub fn new(schema: &'a Schema, resolver: &'a dyn CollationResolver) -> Self {
        Self {
            schema,
            evaluator: Evaluator::new(resolver),
        }
    }

    /// Compute the document that results from applying `data` to `base`.
    ///
    /// With `base == None` a new record is built and checked for required
    /// fields afterwards; list fields that were not written start empty.
    pub fn apply(
        &self,
        base: Option<&Document>,
        type_name: &str,
        data: &UpdateData,
    ) -> QueryResult<Document> {
        let ty = self.schema.require(type_name)?;
        let mut doc = base.cloned().unwrap_or_default();
        self.apply_fields(&mut doc, ty, data, "", "")?;

        if base.is_none() {
            for field in ty.fields.values() {
                if field.modifier.is_list() && !doc.contains(&field.name) {
                    doc.insert(field.name.as_str(), Value::List(Vec::new()));
                }
            }
            self.check_required(&doc, ty, "")?;
        }
        Ok(doc)
    }

    // `prefix` carries list indices for error context; `scope` is the same
    // path without indices, used for collation lookup.
    fn apply_fields(
        &self,
        doc: &mut Document,
        ty: &TypeDef,
        data: &UpdateData,
        prefix: &str,
        scope: &str,
    ) -> QueryResult<()> {
        for (name, mutation) in data.iter() {
            let path = join(prefix, name);
            let scope = join(scope, name);
            let field = ty
                .get_field(name)
                .ok_or_else(|| QueryError::unknown_field(ty.name.as_str(), &path))?;
            trace!(field = %path, mutation = mutation.name(), "applying mutation");

            let next = self
                .apply_field(doc.get(name), ty, field, mutation, &path, &scope)
                .map_err(|e| match e.context.type_name {
                    Some(_) => e,
                    None => e.with_type(ty.name.as_str()),
                })?;
            doc.insert(name, next);
        }
        Ok(())
    }

    fn apply_field(
        &self,
        current: &Value,
        owner: &TypeDef,
        field: &FieldDef,
        mutation: &Mutation,
        path: &str,
        scope: &str,
    ) -> QueryResult<Value> {
        match mutation {
            Mutation::Set(Value::Unset) | Mutation::Unset => {
                if field.is_required() {
                    return Err(QueryError::required_field(owner.name.as_str(), path));
                }
                Ok(Value::Unset)
            }
            Mutation::Set(value) => {
                self.check_value(owner, field, value, path)?;
                Ok(value.clone())
            }
            Mutation::Update(data) => match current {
                Value::Document(nested) => {
                    let ty = self.composite_type(field, path, "update")?;
                    let mut nested = nested.clone();
                    self.apply_fields(&mut nested, ty, data, path, scope)?;
                    Ok(Value::Document(nested))
                }
                Value::Unset | Value::Null => Err(QueryError::missing_target(path)),
                other => Err(QueryError::invalid_data_type(path, "document", other.type_name())),
            },
            Mutation::Upsert { set, update } => match current {
                Value::Unset | Value::Null => {
                    let set = Mutation::Set(set.clone());
                    self.apply_field(current, owner, field, &set, path, scope)
                }
                _ => {
                    let update = Mutation::Update(update.clone());
                    self.apply_field(current, owner, field, &update, path, scope)
                }
            },
            Mutation::Push(values) => {
                if !field.modifier.is_list() {
                    return Err(QueryError::invalid_data_type(
                        path,
                        "list field",
                        field.field_type.type_name(),
                    ));
                }
                let mut items = match current {
                    Value::List(items) => items.clone(),
                    Value::Unset | Value::Null => Vec::with_capacity(values.len()),
                    other => {
                        return Err(QueryError::invalid_data_type(path, "list", other.type_name()));
                    }
                };
                let start = items.len();
                for (offset, value) in values.iter().enumerate() {
                    self.check_element(field, value, &format!("{}[{}]", path, start + offset))?;
                    items.push(value.clone());
                }
                Ok(Value::List(items))
            }
            Mutation::UpdateMany { filter, update } => {
                let ty = self.composite_list_type(field, path, "updateMany")?;
                let items = match current {
                    Value::List(items) => items,
                    Value::Unset | Value::Null => return Ok(current.clone()),
                    other => {
                        return Err(QueryError::invalid_data_type(path, "list", other.type_name()));
                    }
                };
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let element_path = format!("{}[{}]", path, i);
                    let Value::Document(element) = item else {
                        return Err(QueryError::invalid_data_type(
                            element_path,
                            "document",
                            item.type_name(),
                        ));
                    };
                    if self.evaluator.matches_at(element, filter, scope)? {
                        let mut element = element.clone();
                        self.apply_fields(&mut element, ty, update, &element_path, scope)?;
                        out.push(Value::Document(element));
                    } else {
                        out.push(item.clone());
                    }
                }
                Ok(Value::List(out))
            }
            Mutation::DeleteMany(filter) => {
                self.composite_list_type(field, path, "deleteMany")?;
                let items = match current {
                    Value::List(items) => items,
                    Value::Unset | Value::Null => return Ok(current.clone()),
                    other => {
                        return Err(QueryError::invalid_data_type(path, "list", other.type_name()));
                    }
                };
                let mut survivors = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let keep = match item {
                        Value::Document(element) => {
                            !self.evaluator.matches_at(element, filter, scope)?
                        }
                        other => {
                            return Err(QueryError::invalid_data_type(
                                format!("{}[{}]", path, i),
                                "document",
                                other.type_name(),
                            ));
                        }
                    };
                    if keep {
                        survivors.push(item.clone());
                    }
                }
                Ok(Value::List(survivors))
            }
            Mutation::Numeric(op, operand) => apply_numeric(current, field, *op, operand, path),
        }
    }

    fn composite_type(&self, field: &FieldDef, path: &str, name: &str) -> QueryResult<&'a TypeDef> {
        match &field.field_type {
            FieldType::Composite(type_name) if !field.modifier.is_list() => {
                self.schema.require(type_name)
            }
            other => Err(QueryError::invalid_data_type(path, "composite field", other.type_name())
                .with_help(format!("{} applies to single composite fields", name))),
        }
    }

    fn composite_list_type(
        &self,
        field: &FieldDef,
        path: &str,
        name: &str,
    ) -> QueryResult<&'a TypeDef> {
        match &field.field_type {
            FieldType::Composite(type_name) if field.modifier.is_list() => {
                self.schema.require(type_name)
            }
            other => Err(QueryError::invalid_data_type(
                path,
                "composite list field",
                other.type_name(),
            )
            .with_help(format!("{} applies to lists of composite documents", name))),
        }
    }

    fn check_value(
        &self,
        owner: &TypeDef,
        field: &FieldDef,
        value: &Value,
        path: &str,
    ) -> QueryResult<()> {
        match value {
            Value::Unset | Value::Null => {
                if field.is_required() {
                    return Err(QueryError::required_field(owner.name.as_str(), path));
                }
                Ok(())
            }
            Value::List(items) if field.modifier.is_list() => {
                for (i, item) in items.iter().enumerate() {
                    self.check_element(field, item, &format!("{}[{}]", path, i))?;
                }
                Ok(())
            }
            other if field.modifier.is_list() => {
                Err(QueryError::invalid_data_type(path, "list", other.type_name()))
            }
            other => self.check_element(field, other, path),
        }
    }

    fn check_element(&self, field: &FieldDef, value: &Value, path: &str) -> QueryResult<()> {
        if !field.accepts_element(value) {
            return Err(QueryError::invalid_data_type(
                path,
                field.field_type.type_name(),
                value.type_name(),
            ));
        }
        if let (FieldType::Composite(type_name), Value::Document(doc)) = (&field.field_type, value) {
            let ty = self.schema.require(type_name)?;
            self.check_document(doc, ty, path)?;
        }
        Ok(())
    }

    fn check_document(&self, doc: &Document, ty: &TypeDef, prefix: &str) -> QueryResult<()> {
        for (name, value) in doc.iter() {
            let path = join(prefix, name);
            let field = ty
                .get_field(name)
                .ok_or_else(|| QueryError::unknown_field(ty.name.as_str(), &path))?;
            self.check_value(ty, field, value, &path)?;
        }
        self.check_required(doc, ty, prefix)
    }

    fn check_required(&self, doc: &Document, ty: &TypeDef, prefix: &str) -> QueryResult<()> {
        for field in ty.fields.values() {
            if field.modifier == TypeModifier::Required && !doc.contains(&field.name) {
                return Err(QueryError::required_field(
                    ty.name.as_str(),
                    join(prefix, &field.name),
                ));
            }
        }
        Ok(())
    }
}

fn apply_numeric(
    current: &Value,
    field: &FieldDef,
    op: NumericOp,
    operand: &Value,
    path: &str,
) -> QueryResult<Value> {
    let int_field = match field.field_type {
        FieldType::Scalar(ScalarType::Int) => true,
        FieldType::Scalar(ScalarType::Float) => false,
        ref other => {
            return Err(QueryError::invalid_data_type(path, "numeric field", other.type_name()));
        }
    };
    if field.modifier.is_list() {
        return Err(QueryError::invalid_data_type(path, "numeric field", "list"));
    }

    let result = match (current, operand) {
        (Value::Unset | Value::Null, _) => return Ok(current.clone()),
        (Value::Int(a), Value::Int(b)) if int_field => {
            let (a, b) = (*a, *b);
            let value = match op {
                NumericOp::Increment => a.checked_add(b),
                NumericOp::Decrement => a.checked_sub(b),
                NumericOp::Multiply => a.checked_mul(b),
                NumericOp::Divide => {
                    if b == 0 {
                        return Err(QueryError::invalid_parameter(path, "division by zero"));
                    }
                    a.checked_div(b)
                }
            };
            Value::Int(value.ok_or_else(|| {
                QueryError::invalid_parameter(path, format!("{} overflows a 64-bit integer", op.as_str()))
            })?)
        }
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) if !int_field => {
            let a = current.as_f64().unwrap_or_default();
            let b = operand.as_f64().unwrap_or_default();
            Value::Float(match op {
                NumericOp::Increment => a + b,
                NumericOp::Decrement => a - b,
                NumericOp::Multiply => a * b,
                NumericOp::Divide => {
                    if b == 0.0 {
                        return Err(QueryError::invalid_parameter(path, "division by zero"));
                    }
                    a / b
                }
            })
        }
        (Value::Int(_) | Value::Float(_), other) => {
            let expected = if int_field { "int" } else { "number" };
            return Err(QueryError::invalid_data_type(path, expected, other.type_name()));
        }
        (other, _) => {
            return Err(QueryError::invalid_data_type(path, "number", other.type_name()));
        }
    };
    Ok(result)
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::Collation;
    use crate::doc;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        Schema::new()
            .with_type(
                TypeDef::composite("Address")
                    .field("street", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
                    .field("city", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
                    .field("zip", FieldType::Scalar(ScalarType::String), TypeModifier::Optional),
            )
            .with_type(
                TypeDef::composite("Photo")
                    .field("url", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
                    .field("height", FieldType::Scalar(ScalarType::Int), TypeModifier::Required),
            )
            .with_type(
                TypeDef::model("User")
                    .field("id", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
                    .field("name", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
                    .field("nickname", FieldType::Scalar(ScalarType::String), TypeModifier::Optional)
                    .field("score", FieldType::Scalar(ScalarType::Int), TypeModifier::Optional)
                    .field("rating", FieldType::Scalar(ScalarType::Float), TypeModifier::Optional)
                    .field("address", FieldType::Composite("Address".into()), TypeModifier::Optional)
                    .field("photos", FieldType::Composite("Photo".into()), TypeModifier::List),
            )
    }

    fn photo(url: &str, height: i64) -> Value {
        Value::from(doc! { "url" => url, "height" => height })
    }

    fn user() -> Document {
        doc! {
            "id" => "u1",
            "name" => "Alice",
            "address" => doc! { "street" => "1 Main", "city" => "Springfield", "zip" => "11111" },
            "photos" => vec![photo("a", 100), photo("b", 200), photo("c", 100)],
        }
    }

    fn apply(base: Option<&Document>, data: UpdateData) -> QueryResult<Document> {
        let schema = schema();
        Applicator::new(&schema, &Collation::CaseSensitive).apply(base, "User", &data)
    }

    #[test]
    fn test_unset_optional_removes_field() {
        let base = user().with("nickname", "Al");
        let out = apply(Some(&base), UpdateData::new().unset("nickname")).unwrap();
        assert!(out.get("nickname").is_unset());
        assert!(base.get("nickname").as_str().is_some());
    }

    #[test]
    fn test_unset_required_is_violation() {
        let err = apply(Some(&user()), UpdateData::new().unset("name")).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredFieldViolation);
        assert_eq!(err.context.field.as_deref(), Some("name"));

        let err = apply(Some(&user()), UpdateData::new().set("name", Value::Null)).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredFieldViolation);

        let err = apply(Some(&user()), UpdateData::new().unset("photos")).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredFieldViolation);
    }

    #[test]
    fn test_set_null_on_optional_keeps_field() {
        let out = apply(Some(&user()), UpdateData::new().set("address", Value::Null)).unwrap();
        assert!(out.get("address").is_null());
    }

    #[test]
    fn test_update_merges_named_fields_only() {
        let data = UpdateData::new().update("address", UpdateData::new().set("city", "Shelbyville"));
        let out = apply(Some(&user()), data).unwrap();
        assert_eq!(
            out.get("address"),
            &Value::from(doc! { "street" => "1 Main", "city" => "Shelbyville", "zip" => "11111" })
        );
    }

    #[test]
    fn test_update_on_absent_is_missing_target() {
        let base = user().with("address", Value::Null);
        let data = UpdateData::new().update("address", UpdateData::new().set("city", "x"));
        let err = apply(Some(&base), data).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingTarget);

        let mut base = user();
        base.remove("address");
        let data = UpdateData::new().update("address", UpdateData::new().set("city", "x"));
        assert_eq!(apply(Some(&base), data).unwrap_err().code, ErrorCode::MissingTarget);
    }

    #[test]
    fn test_upsert_branches() {
        let set = doc! { "street" => "2 Elm", "city" => "Ogdenville" };
        let update = UpdateData::new().set("city", "North Haverbrook");

        let mut unset_base = user();
        unset_base.remove("address");
        let created = apply(
            Some(&unset_base),
            UpdateData::new().upsert("address", set.clone(), update.clone()),
        )
        .unwrap();
        let direct = apply(Some(&unset_base), UpdateData::new().set("address", set.clone())).unwrap();
        assert_eq!(created, direct);

        let updated = apply(
            Some(&user()),
            UpdateData::new().upsert("address", set, update.clone()),
        )
        .unwrap();
        let merged = apply(Some(&user()), UpdateData::new().update("address", update)).unwrap();
        assert_eq!(updated, merged);
    }

    #[test]
    fn test_set_document_checks_required_and_unknown() {
        let err = apply(
            Some(&user()),
            UpdateData::new().set("address", doc! { "street" => "x" }),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredFieldViolation);
        assert_eq!(err.context.field.as_deref(), Some("address.city"));

        let err = apply(
            Some(&user()),
            UpdateData::new().set("address", doc! { "street" => "x", "city" => "y", "planet" => "z" }),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownField);
    }

    #[test]
    fn test_push_appends_in_order() {
        let out = apply(
            Some(&user()),
            UpdateData::new().push("photos", vec![photo("d", 50), photo("e", 60)]),
        )
        .unwrap();
        let urls: Vec<_> = out
            .get("photos")
            .as_list()
            .unwrap()
            .iter()
            .map(|p| p.as_document().unwrap().get("url").as_str().unwrap())
            .collect();
        assert_eq!(urls, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_push_rejects_bad_element() {
        let err = apply(
            Some(&user()),
            UpdateData::new().push("photos", vec![Value::from(doc! { "url" => "z" })]),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredFieldViolation);
        assert_eq!(err.context.field.as_deref(), Some("photos[3].height"));

        let err = apply(Some(&user()), UpdateData::new().push("name", vec!["x"])).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDataType);
    }

    #[test]
    fn test_update_many_touches_matching_elements() {
        let data = UpdateData::new().update_many(
            "photos",
            Filter::eq("height", 100),
            UpdateData::new().set("height", 150),
        );
        let out = apply(Some(&user()), data).unwrap();
        assert_eq!(
            out.get("photos"),
            &Value::List(vec![photo("a", 150), photo("b", 200), photo("c", 150)])
        );
    }

    #[test]
    fn test_update_many_on_unset_list_is_noop() {
        let mut base = user();
        base.remove("photos");
        let data = UpdateData::new().update_many("photos", Filter::none(), UpdateData::new());
        let out = apply(Some(&base), data).unwrap();
        assert!(out.get("photos").is_unset());
    }

    #[test]
    fn test_update_many_error_names_element() {
        let data = UpdateData::new().update_many(
            "photos",
            Filter::eq("url", "b"),
            UpdateData::new().unset("url"),
        );
        let err = apply(Some(&user()), data).unwrap_err();
        assert_eq!(err.context.field.as_deref(), Some("photos[1].url"));
    }

    #[test]
    fn test_delete_many_preserves_survivor_order() {
        let data = UpdateData::new().delete_many("photos", Filter::eq("height", 100));
        let out = apply(Some(&user()), data).unwrap();
        assert_eq!(out.get("photos"), &Value::List(vec![photo("b", 200)]));
    }

    #[test]
    fn test_create_fills_lists_and_checks_required() {
        let out = apply(None, UpdateData::new().set("id", "u2").set("name", "Bob")).unwrap();
        assert_eq!(out.get("photos"), &Value::List(vec![]));
        assert!(out.get("address").is_unset());

        let err = apply(None, UpdateData::new().set("id", "u3")).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredFieldViolation);
        assert_eq!(err.context.field.as_deref(), Some("name"));
    }

    #[test]
    fn test_unknown_field() {
        let err = apply(Some(&user()), UpdateData::new().set("age", 3)).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownField);
        assert_eq!(err.context.type_name.as_deref(), Some("User"));
    }

    #[test]
    fn test_numeric_operations() {
        let base = user().with("score", 10).with("rating", 4.0);
        let out = apply(
            Some(&base),
            UpdateData::new().increment("score", 5).divide("rating", 2),
        )
        .unwrap();
        assert_eq!(out.get("score"), &Value::Int(15));
        assert_eq!(out.get("rating"), &Value::Float(2.0));

        let err = apply(Some(&base), UpdateData::new().divide("score", 0)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameter);

        let err = apply(Some(&base), UpdateData::new().increment("score", 1.5)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDataType);

        let out = apply(Some(&user()), UpdateData::new().increment("score", 1)).unwrap();
        assert!(out.get("score").is_unset());
    }

    #[test]
    fn test_update_data_keeps_declared_order() {
        let data = UpdateData::new().set("b", 1).unset("a").set("b", 2);
        let names: Vec<_> = data.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(data.get("b"), Some(&Mutation::Set(Value::Int(2))));
    }

    fn catalog() -> Schema {
        Schema::new()
            .with_type(
                TypeDef::composite("Tag")
                    .field("name", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
                    .field("hits", FieldType::Scalar(ScalarType::Int), TypeModifier::Optional),
            )
            .with_type(
                TypeDef::composite("Variant")
                    .field("tags", FieldType::Composite("Tag".into()), TypeModifier::List),
            )
            .with_type(
                TypeDef::model("Product")
                    .field("variants", FieldType::Composite("Variant".into()), TypeModifier::List),
            )
    }

    #[test]
    fn test_nested_list_mutations_use_unindexed_collation_path() {
        let schema = catalog();
        let collation = crate::collation::CollationMap::new(Collation::CaseSensitive)
            .with_override("variants.tags.name", Collation::CaseInsensitive);
        let product = doc! {
            "variants" => vec![Value::from(doc! {
                "tags" => vec![Value::from(doc! { "name" => "A" })],
            })],
        };

        let filter = Filter::some("variants", Filter::some("tags", Filter::eq("name", "a")));
        assert!(Evaluator::new(&collation).matches(&product, &filter).unwrap());

        let applicator = Applicator::new(&schema, &collation);
        let data = UpdateData::new().update_many(
            "variants",
            Filter::none(),
            UpdateData::new().update_many(
                "tags",
                Filter::eq("name", "a"),
                UpdateData::new().set("hits", 1),
            ),
        );
        let out = applicator.apply(Some(&product), "Product", &data).unwrap();
        let expected = doc! {
            "variants" => vec![Value::from(doc! {
                "tags" => vec![Value::from(doc! { "name" => "A", "hits" => 1 })],
            })],
        };
        assert_eq!(out, expected);

        let data = UpdateData::new().update_many(
            "variants",
            Filter::none(),
            UpdateData::new().delete_many("tags", Filter::eq("name", "a")),
        );
        let out = applicator.apply(Some(&product), "Product", &data).unwrap();
        assert_eq!(out.get_path("variants").as_list().map(|v| v.len()), Some(1));
        let tags = out.get("variants").as_list().unwrap()[0]
            .as_document()
            .unwrap()
            .get("tags")
            .clone();
        assert_eq!(tags, Value::List(Vec::new()));
    }

    #[test]
    fn test_nested_list_error_path_keeps_indices() {
        let schema = catalog();
        let product = doc! {
            "variants" => vec![
                Value::from(doc! { "tags" => Vec::<Value>::new() }),
                Value::from(doc! { "tags" => vec![Value::from(doc! { "name" => "x" })] }),
            ],
        };
        let data = UpdateData::new().update_many(
            "variants",
            Filter::none(),
            UpdateData::new().update_many("tags", Filter::none(), UpdateData::new().unset("name")),
        );
        let err = Applicator::new(&schema, &Collation::CaseSensitive)
            .apply(Some(&product), "Product", &data)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredFieldViolation);
        assert_eq!(err.context.field.as_deref(), Some("variants[1].tags[0].name"));
    }
}
