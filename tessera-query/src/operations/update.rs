//! UpdateMany operation for modifying existing documents.

use crate::document::Document;
use crate::driver::DataStoreDriver;
use crate::error::QueryResult;
use crate::filter::Filter;
use crate::mutation::{Mutation, UpdateData};
use crate::planner::{Operation, OperationKind, QueryPlanner};
use crate::types::Select;
use crate::value::Value;

/// An update operation applied to every matching document.
///
/// # Example
///
/// ```rust,ignore
/// let updated = planner
///     .update_many("products", "Product")
///     .r#where(Filter::some("photos", Filter::eq("height", 100)))
///     .field("photos", Mutation::DeleteMany(Filter::eq("height", 100)))
///     .exec()
///     .await?;
/// ```
pub struct UpdateManyOperation<'a, D: DataStoreDriver> {
    planner: &'a QueryPlanner<D>,
    op: Operation,
    data: UpdateData,
}

impl<'a, D: DataStoreDriver> UpdateManyOperation<'a, D> {
    /// Create a new UpdateMany operation.
    pub fn new(
        planner: &'a QueryPlanner<D>,
        collection: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            planner,
            op: Operation::new(OperationKind::Update, collection).model(model),
            data: UpdateData::new(),
        }
    }

    /// Add a filter condition.
    pub fn r#where(mut self, filter: impl Into<Filter>) -> Self {
        self.op = self.op.filter(filter.into());
        self
    }

    /// Set a field to a new value.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data = self.data.set(field, value);
        self
    }

    /// Add a field mutation.
    pub fn field(mut self, field: impl Into<String>, mutation: Mutation) -> Self {
        self.data = self.data.field(field, mutation);
        self
    }

    /// Replace all field mutations.
    pub fn data(mut self, data: UpdateData) -> Self {
        self.data = data;
        self
    }

    /// Select specific fields to return.
    pub fn select(mut self, select: impl Into<Select>) -> Self {
        self.op = self.op.select(select.into());
        self
    }

    /// Execute the update and return the modified documents.
    pub async fn exec(self) -> QueryResult<Vec<Document>> {
        let op = self.op.data(self.data);
        Ok(self.planner.execute(op).await?.into_documents())
    }
}
