//! Filter evaluation and document ordering.
//!
//! The [`Evaluator`] walks a [`Filter`] tree against a [`Document`] and
//! resolves string collation per dotted field path: a collation set on the
//! filter leaf wins, otherwise the [`CollationResolver`] decides.
//!
//! ```rust
//! use tessera_query::{doc, Collation, Evaluator, Filter};
//!
//! let user = doc! {
//!     "address" => doc! {
//!         "street" => "555 Candy Cane Lane",
//!         "city" => "Wonderland",
//!         "zip" => "52337",
//!     },
//! };
//!
//! let eval = Evaluator::new(&Collation::CaseSensitive);
//!
//! let is = Filter::is("address", Filter::eq("street", "555 Candy Cane Lane"));
//! assert!(eval.matches(&user, &is).unwrap());
//!
//! let equals = Filter::equals(
//!     "address",
//!     doc! { "street" => "555 Candy Cane Lane", "city" => "Wonderland" },
//! );
//! assert!(!eval.matches(&user, &equals).unwrap());
//! ```

use std::cmp::Ordering;

use tracing::trace;

use crate::collation::{Collation, CollationResolver};
use crate::document::Document;
use crate::error::{QueryError, QueryResult};
use crate::filter::{CompareOp, Condition, Filter};
use crate::types::{NullsOrder, OrderBy, SortOrder};
use crate::value::Value;

/// Evaluates filters against documents.
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    resolver: &'a dyn CollationResolver,
}

impl std::fmt::Debug for Evaluator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator").finish_non_exhaustive()
    }
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator using `resolver` for default collations.
    pub fn new(resolver: &'a dyn CollationResolver) -> Self {
        Self { resolver }
    }

    /// Check whether `doc` matches `filter`.
    pub fn matches(&self, doc: &Document, filter: &Filter) -> QueryResult<bool> {
        self.eval(doc, filter, "")
    }

    /// Check whether `doc`, nested at `prefix`, matches `filter`.
    ///
    /// Collation is resolved for `prefix` joined with each leaf path, which
    /// lets callers evaluate list elements with their full path.
    pub fn matches_at(&self, doc: &Document, filter: &Filter, prefix: &str) -> QueryResult<bool> {
        self.eval(doc, filter, prefix)
    }

    fn eval(&self, doc: &Document, filter: &Filter, prefix: &str) -> QueryResult<bool> {
        match filter {
            Filter::None => Ok(true),
            Filter::Field(path, condition) => {
                let full = join(prefix, path);
                self.eval_condition(doc.get_path(path), condition, &full)
            }
            Filter::And(children) => {
                for child in children {
                    if !self.eval(doc, child, prefix)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Or(children) => {
                for child in children {
                    if self.eval(doc, child, prefix)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Filter::Not(inner) => Ok(!self.eval(doc, inner, prefix)?),
        }
    }

    fn eval_condition(&self, value: &Value, condition: &Condition, path: &str) -> QueryResult<bool> {
        trace!(
            path,
            condition = condition.name(),
            found = value.type_name(),
            "evaluating condition"
        );
        match condition {
            Condition::Equals(expected) => Ok(self.values_equal(value, expected, path, None)),
            Condition::Is(sub) => self.eval_is(value, sub, path, "is"),
            Condition::IsNot(sub) => Ok(!self.eval_is(value, sub, path, "isNot")?),
            Condition::IsSet(set) => Ok(value.is_unset() != *set),
            Condition::Every(sub) => self.eval_every(value, sub, path),
            Condition::Some(sub) => self.eval_some(value, sub, path),
            Condition::None(sub) => Ok(!self.eval_some(value, sub, path)?),
            Condition::IsEmpty(empty) => match value {
                Value::List(items) => Ok(items.is_empty() == *empty),
                Value::Unset | Value::Null => Ok(false),
                other => Err(type_error("isEmpty", other, path)),
            },
            Condition::Compare {
                op,
                value: operand,
                collation,
            } => self.eval_compare(value, *op, operand, *collation, path),
        }
    }

    fn eval_is(&self, value: &Value, sub: &Filter, path: &str, name: &str) -> QueryResult<bool> {
        match value {
            Value::Document(nested) => self.eval(nested, sub, path),
            Value::Unset | Value::Null => Ok(false),
            other => Err(type_error(name, other, path)),
        }
    }

    fn eval_every(&self, value: &Value, sub: &Filter, path: &str) -> QueryResult<bool> {
        match value {
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if !self.eval_element(item, sub, path, i, "every")? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Value::Unset | Value::Null => Ok(true),
            other => Err(type_error("every", other, path)),
        }
    }

    fn eval_some(&self, value: &Value, sub: &Filter, path: &str) -> QueryResult<bool> {
        match value {
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if self.eval_element(item, sub, path, i, "some")? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Value::Unset | Value::Null => Ok(false),
            other => Err(type_error("some", other, path)),
        }
    }

    fn eval_element(
        &self,
        item: &Value,
        sub: &Filter,
        path: &str,
        index: usize,
        name: &str,
    ) -> QueryResult<bool> {
        match item {
            Value::Document(element) => self.eval(element, sub, path),
            other => Err(QueryError::predicate_type(name, other.type_name())
                .with_field(format!("{path}[{index}]"))),
        }
    }

    fn eval_compare(
        &self,
        value: &Value,
        op: CompareOp,
        operand: &Value,
        leaf: Option<Collation>,
        path: &str,
    ) -> QueryResult<bool> {
        let name = op.as_str();
        let structured = matches!(value, Value::List(_) | Value::Document(_));
        if structured && !matches!(op, CompareOp::Eq | CompareOp::Ne) {
            return Err(type_error(name, value, path));
        }

        match op {
            CompareOp::Eq => Ok(self.values_equal(value, operand, path, leaf)),
            CompareOp::Ne => Ok(!self.values_equal(value, operand, path, leaf)),
            _ if op.is_ordering() => {
                if value.is_absent() {
                    return Ok(false);
                }
                let ordering = self.compare_scalars(value, operand, self.resolve(leaf, path));
                Ok(match ordering {
                    Some(o) => match op {
                        CompareOp::Lt => o == Ordering::Less,
                        CompareOp::Lte => o != Ordering::Greater,
                        CompareOp::Gt => o == Ordering::Greater,
                        _ => o != Ordering::Less,
                    },
                    None => false,
                })
            }
            _ if op.is_substring() => {
                let needle = match operand {
                    Value::String(s) => s,
                    other => {
                        return Err(QueryError::predicate_type(name, other.type_name())
                            .with_field(path)
                            .with_help("string filters take a string operand"));
                    }
                };
                let Value::String(haystack) = value else {
                    return Ok(false);
                };
                let collation = self.resolve(leaf, path);
                Ok(match op {
                    CompareOp::Contains => collation.contains(haystack, needle),
                    CompareOp::StartsWith => collation.starts_with(haystack, needle),
                    _ => collation.ends_with(haystack, needle),
                })
            }
            // in, notIn
            _ => {
                let candidates = match operand {
                    Value::List(items) => items,
                    other => {
                        return Err(QueryError::predicate_type(name, other.type_name())
                            .with_field(path)
                            .with_help("in and notIn take a list operand"));
                    }
                };
                let found = candidates
                    .iter()
                    .any(|c| self.values_equal(value, c, path, leaf));
                Ok(found == matches!(op, CompareOp::In))
            }
        }
    }

    fn resolve(&self, leaf: Option<Collation>, path: &str) -> Collation {
        leaf.unwrap_or_else(|| self.resolver.collation(path))
    }

    /// Structural equality with collation-aware strings.
    ///
    /// Documents must hold the same field set. Unset equals nothing.
    pub fn values_equal(&self, a: &Value, b: &Value, path: &str, leaf: Option<Collation>) -> bool {
        match (a, b) {
            (Value::Unset, _) | (_, Value::Unset) => false,
            (Value::Null, Value::Null) => true,
            (Value::String(x), Value::String(y)) => self.resolve(leaf, path).equals(x, y),
            (Value::Document(x), Value::Document(y)) => {
                x.len() == y.len()
                    && x.iter().all(|(k, v)| {
                        let other = y.get(k);
                        !other.is_unset() && self.values_equal(v, other, &join(path, k), leaf)
                    })
            }
            (Value::List(x), Value::List(y)) => {
                x.len() == y.len()
                    && x.iter()
                        .zip(y)
                        .all(|(l, r)| self.values_equal(l, r, path, leaf))
            }
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                numeric_cmp(a, b) == Some(Ordering::Equal)
            }
            (Value::Reference(id), Value::String(s)) | (Value::String(s), Value::Reference(id)) => {
                id.as_str() == s
            }
            _ => a == b,
        }
    }

    /// Order two scalars; `None` when their types are not comparable.
    pub fn compare_scalars(&self, a: &Value, b: &Value, collation: Collation) -> Option<Ordering> {
        match (a, b) {
            (Value::String(x), Value::String(y)) => Some(collation.compare(x, y)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => numeric_cmp(a, b),
            (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
            (Value::DateTime(x), Value::DateTime(y)) => Some(x.cmp(y)),
            (Value::Bytes(x), Value::Bytes(y)) => Some(x.cmp(y)),
            (Value::Reference(x), Value::Reference(y)) => Some(x.cmp(y)),
            _ => None,
        }
    }

    /// Sort documents in place; the sort is stable.
    pub fn sort(&self, docs: &mut [Document], order: &OrderBy) {
        if order.is_empty() {
            return;
        }
        docs.sort_by(|a, b| self.compare_documents(a, b, order));
    }

    /// Compare two documents under an ordering.
    pub fn compare_documents(&self, a: &Document, b: &Document, order: &OrderBy) -> Ordering {
        for field in order.fields() {
            let left = a.get_path(&field.path);
            let right = b.get_path(&field.path);
            let ordering = match (left.is_absent(), right.is_absent()) {
                (true, true) => Ordering::Equal,
                (true, false) | (false, true) => {
                    // Placement of absent values does not flip with the direction.
                    let absent_first = field.effective_nulls() == NullsOrder::First;
                    let left_first = left.is_absent() == absent_first;
                    if left_first {
                        Ordering::Less
                    } else {
                        Ordering::Greater
                    }
                }
                (false, false) => {
                    let collation = self.resolve(field.collation, &field.path);
                    let o = self
                        .compare_scalars(left, right, collation)
                        .unwrap_or_else(|| type_rank(left).cmp(&type_rank(right)));
                    match field.order {
                        SortOrder::Asc => o,
                        SortOrder::Desc => o.reverse(),
                    }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn join(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{prefix}.{path}")
    }
}

fn numeric_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

// Fallback ordering between values of different kinds.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Unset | Value::Null => 0,
        Value::Int(_) | Value::Float(_) => 1,
        Value::String(_) => 2,
        Value::Document(_) => 3,
        Value::List(_) => 4,
        Value::Bytes(_) => 5,
        Value::Reference(_) => 6,
        Value::Bool(_) => 7,
        Value::DateTime(_) => 8,
    }
}

fn type_error(condition: &str, found: &Value, path: &str) -> QueryError {
    QueryError::predicate_type(condition, found.type_name()).with_field(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::CollationMap;
    use crate::doc;
    use crate::types::OrderByField;
    use crate::ErrorCode;

    fn sensitive() -> Evaluator<'static> {
        Evaluator::new(&Collation::CaseSensitive)
    }

    fn photos() -> Document {
        doc! {
            "photos" => vec![
                Value::from(doc! { "url" => "1.jpg", "height" => 100 }),
                Value::from(doc! { "url" => "2.jpg", "height" => 200 }),
            ],
            "tags" => Vec::<Value>::new(),
        }
    }

    #[test]
    fn test_is_set_distinguishes_null_and_unset() {
        let d = doc! { "bio" => Value::Null, "name" => "a" };
        let e = sensitive();
        assert!(e.matches(&d, &Filter::is_set("bio", true)).unwrap());
        assert!(!e.matches(&d, &Filter::is_set("bio", false)).unwrap());
        assert!(e.matches(&d, &Filter::is_set("nickname", false)).unwrap());
        assert!(!e.matches(&d, &Filter::is_set("nickname", true)).unwrap());
    }

    #[test]
    fn test_list_quantifiers_on_empty_list() {
        let d = photos();
        let e = sensitive();
        let p = Filter::eq("url", "x");
        assert!(e.matches(&d, &Filter::every("tags", p.clone())).unwrap());
        assert!(!e.matches(&d, &Filter::some("tags", p.clone())).unwrap());
        assert!(e.matches(&d, &Filter::none_of("tags", p)).unwrap());
        assert!(e.matches(&d, &Filter::is_empty_list("tags", true)).unwrap());
        assert!(!e.matches(&d, &Filter::is_empty_list("tags", false)).unwrap());
    }

    #[test]
    fn test_list_quantifiers_on_unset_list() {
        let d = doc! {};
        let e = sensitive();
        let p = Filter::eq("url", "x");
        assert!(e.matches(&d, &Filter::every("photos", p.clone())).unwrap());
        assert!(!e.matches(&d, &Filter::some("photos", p.clone())).unwrap());
        assert!(e.matches(&d, &Filter::none_of("photos", p)).unwrap());
        assert!(!e.matches(&d, &Filter::is_empty_list("photos", true)).unwrap());
        assert!(!e.matches(&d, &Filter::is_empty_list("photos", false)).unwrap());
    }

    #[test]
    fn test_some_none_every_on_photos() {
        let d = photos();
        let e = sensitive();
        assert!(e.matches(&d, &Filter::some("photos", Filter::eq("url", "2.jpg"))).unwrap());
        assert!(!e.matches(&d, &Filter::none_of("photos", Filter::eq("url", "2.jpg"))).unwrap());
        assert!(e.matches(&d, &Filter::every("photos", Filter::gte("height", 100))).unwrap());
        assert!(!e.matches(&d, &Filter::every("photos", Filter::gt("height", 100))).unwrap());
    }

    #[test]
    fn test_predicate_type_errors() {
        let d = doc! { "name" => "Alice", "address" => doc! { "city" => "x" } };
        let e = sensitive();

        let err = e.matches(&d, &Filter::is_empty_list("name", true)).unwrap_err();
        assert_eq!(err.code, ErrorCode::PredicateType);
        assert_eq!(err.context.field.as_deref(), Some("name"));

        let err = e.matches(&d, &Filter::is("name", Filter::none())).unwrap_err();
        assert!(err.is_predicate_type());

        let err = e.matches(&d, &Filter::gt("address", 1)).unwrap_err();
        assert!(err.is_predicate_type());

        let err = e.matches(&d, &Filter::contains("name", 1)).unwrap_err();
        assert!(err.is_predicate_type());

        let err = e
            .matches(&d, &Filter::compare("name", CompareOp::In, "Alice"))
            .unwrap_err();
        assert!(err.is_predicate_type());
    }

    #[test]
    fn test_nested_error_names_full_path() {
        let d = doc! { "address" => doc! { "geo" => "north" } };
        let f = Filter::is("address", Filter::some("geo", Filter::none()));
        let err = sensitive().matches(&d, &f).unwrap_err();
        assert_eq!(err.context.field.as_deref(), Some("address.geo"));
    }

    #[test]
    fn test_and_short_circuits_before_error() {
        let d = doc! { "name" => "Alice" };
        let f = Filter::and([Filter::eq("name", "Bob"), Filter::is_empty_list("name", true)]);
        assert!(!sensitive().matches(&d, &f).unwrap());

        let f = Filter::or([Filter::eq("name", "Alice"), Filter::is_empty_list("name", true)]);
        assert!(sensitive().matches(&d, &f).unwrap());
    }

    #[test]
    fn test_empty_and_or() {
        let d = doc! {};
        assert!(sensitive().matches(&d, &Filter::And(vec![])).unwrap());
        assert!(!sensitive().matches(&d, &Filter::Or(vec![])).unwrap());
    }

    #[test]
    fn test_collation_resolution_order() {
        let d = doc! { "email" => "ALICE@example.com", "code" => "ABC" };
        let map = CollationMap::new(Collation::CaseSensitive)
            .with_override("email", Collation::CaseInsensitive);
        let e = Evaluator::new(&map);

        assert!(e.matches(&d, &Filter::eq("email", "alice@example.com")).unwrap());
        assert!(!e.matches(&d, &Filter::eq("code", "abc")).unwrap());
        assert!(e.matches(&d, &Filter::eq("code", "abc").insensitive()).unwrap());
        assert!(
            !e.matches(
                &d,
                &Filter::eq("email", "alice@example.com").with_collation(Collation::CaseSensitive)
            )
            .unwrap()
        );
    }

    #[test]
    fn test_collation_resolved_for_nested_path() {
        let d = doc! { "photos" => vec![Value::from(doc! { "url" => "A.JPG" })] };
        let map = CollationMap::new(Collation::CaseSensitive)
            .with_override("photos.url", Collation::CaseInsensitive);
        let e = Evaluator::new(&map);
        assert!(e.matches(&d, &Filter::some("photos", Filter::eq("url", "a.jpg"))).unwrap());
    }

    #[test]
    fn test_collation_ignored_for_non_strings() {
        let d = doc! { "n" => 5 };
        let e = Evaluator::new(&Collation::CaseInsensitive);
        assert!(e.matches(&d, &Filter::eq("n", 5.0)).unwrap());
        assert!(e.matches(&d, &Filter::lt("n", 5.5)).unwrap());
        assert!(!e.matches(&d, &Filter::lt("n", "6")).unwrap());
    }

    #[test]
    fn test_in_and_substrings() {
        let d = doc! { "role" => "Admin", "file" => "photo.JPG" };
        let e = sensitive();
        assert!(e.matches(&d, &Filter::in_list("role", vec!["Admin", "Owner"])).unwrap());
        assert!(e.matches(&d, &Filter::not_in("role", vec!["admin"])).unwrap());
        assert!(!e.matches(&d, &Filter::not_in("role", vec!["admin"]).insensitive()).unwrap());
        assert!(e.matches(&d, &Filter::ends_with("file", ".jpg").insensitive()).unwrap());
        assert!(!e.matches(&d, &Filter::ends_with("file", ".jpg")).unwrap());
        assert!(!e.matches(&d, &Filter::starts_with("missing", "p")).unwrap());
    }

    #[test]
    fn test_compare_operand_errors_per_operator_family() {
        let d = doc! { "role" => "Admin", "tags" => vec!["a"] };
        let e = sensitive();

        let err = e.matches(&d, &Filter::contains("role", 1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::PredicateType);
        assert_eq!(err.context.field.as_deref(), Some("role"));

        let err = e.matches(&d, &Filter::compare("role", CompareOp::In, "Admin")).unwrap_err();
        assert_eq!(err.code, ErrorCode::PredicateType);

        let err = e.matches(&d, &Filter::gt("tags", 1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::PredicateType);
        assert_eq!(err.context.field.as_deref(), Some("tags"));

        assert!(!e.matches(&d, &Filter::gte("missing", 1)).unwrap());
    }

    #[test]
    fn test_is_not_on_null_is_true() {
        let d = doc! { "address" => Value::Null };
        let e = sensitive();
        let sub = Filter::eq("city", "x");
        assert!(!e.matches(&d, &Filter::is("address", sub.clone())).unwrap());
        assert!(e.matches(&d, &Filter::is_not("address", sub)).unwrap());
    }

    #[test]
    fn test_sort_nulls_and_direction() {
        let mut docs = vec![
            doc! { "n" => "b" },
            doc! { "n" => Value::Null },
            doc! { "n" => "A" },
            doc! {},
        ];
        let e = sensitive();
        e.sort(&mut docs, &OrderBy::from(OrderByField::asc("n")));
        let names: Vec<_> = docs.iter().map(|d| d.get("n").as_str()).collect();
        assert_eq!(names, vec![None, None, Some("A"), Some("b")]);

        e.sort(&mut docs, &OrderBy::from(OrderByField::desc("n")));
        let names: Vec<_> = docs.iter().map(|d| d.get("n").as_str()).collect();
        assert_eq!(names, vec![Some("b"), Some("A"), None, None]);
    }

    #[test]
    fn test_sort_insensitive() {
        let mut docs = vec![doc! { "n" => "b" }, doc! { "n" => "C" }, doc! { "n" => "a" }];
        let order = OrderBy::from(OrderByField::asc("n").with_collation(Collation::CaseInsensitive));
        sensitive().sort(&mut docs, &order);
        let names: Vec<_> = docs.iter().filter_map(|d| d.get("n").as_str()).collect();
        assert_eq!(names, vec!["a", "b", "C"]);
    }
}
