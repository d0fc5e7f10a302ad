//! Create operation for inserting new records.

use crate::document::Document;
use crate::driver::DataStoreDriver;
use crate::error::QueryResult;
use crate::mutation::{Mutation, UpdateData};
use crate::planner::{Operation, OperationKind, QueryPlanner};
use crate::types::Select;
use crate::value::Value;

/// A create operation for inserting a new record.
///
/// The record is built from the field mutations by the applicator, so
/// required fields are checked and list fields start empty.
///
/// # Example
///
/// ```rust,ignore
/// let user = planner
///     .create("users", "User")
///     .set("id", "u1")
///     .set("address", doc! { "street" => "555 Candy Cane Lane", "city" => "Wonderland" })
///     .exec()
///     .await?;
/// ```
pub struct CreateOperation<'a, D: DataStoreDriver> {
    planner: &'a QueryPlanner<D>,
    op: Operation,
    data: UpdateData,
}

impl<'a, D: DataStoreDriver> CreateOperation<'a, D> {
    /// Create a new Create operation.
    pub fn new(
        planner: &'a QueryPlanner<D>,
        collection: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            planner,
            op: Operation::new(OperationKind::Create, collection).model(model),
            data: UpdateData::new(),
        }
    }

    /// Set a field value.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data = self.data.set(field, value);
        self
    }

    /// Add a field mutation.
    pub fn field(mut self, field: impl Into<String>, mutation: Mutation) -> Self {
        self.data = self.data.field(field, mutation);
        self
    }

    /// Set every field of a document.
    pub fn document(mut self, doc: Document) -> Self {
        for (field, value) in doc {
            self.data = self.data.set(field, value);
        }
        self
    }

    /// Select specific fields to return.
    pub fn select(mut self, select: impl Into<Select>) -> Self {
        self.op = self.op.select(select.into());
        self
    }

    /// Execute the create and return the stored record.
    pub async fn exec(self) -> QueryResult<Document> {
        let op = self.op.data(self.data);
        let mut docs = self.planner.execute(op).await?.into_documents();
        Ok(docs.pop().unwrap_or_default())
    }
}
