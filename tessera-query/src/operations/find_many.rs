//! FindMany operation for querying multiple documents.

use crate::document::Document;
use crate::driver::DataStoreDriver;
use crate::error::QueryResult;
use crate::filter::Filter;
use crate::planner::{Operation, OperationKind, QueryPlanner};
use crate::types::{OrderBy, Select};

/// A query operation that finds multiple documents.
///
/// # Example
///
/// ```rust,ignore
/// let users = planner
///     .find_many("users")
///     .r#where(Filter::some("photos", Filter::eq("url", "2.jpg")))
///     .order_by(OrderByField::desc("created_at"))
///     .skip(0)
///     .take(10)
///     .exec()
///     .await?;
/// ```
pub struct FindManyOperation<'a, D: DataStoreDriver> {
    planner: &'a QueryPlanner<D>,
    op: Operation,
}

impl<'a, D: DataStoreDriver> FindManyOperation<'a, D> {
    /// Create a new FindMany operation.
    pub fn new(planner: &'a QueryPlanner<D>, collection: impl Into<String>) -> Self {
        Self {
            planner,
            op: Operation::new(OperationKind::Find, collection),
        }
    }

    /// Add a filter condition.
    pub fn r#where(mut self, filter: impl Into<Filter>) -> Self {
        self.op = self.op.filter(filter.into());
        self
    }

    /// Set the order by clause.
    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.op = self.op.order_by(order);
        self
    }

    /// Skip a number of documents.
    pub fn skip(mut self, n: u64) -> Self {
        self.op.pagination = self.op.pagination.skip(n);
        self
    }

    /// Take a limited number of documents.
    pub fn take(mut self, n: u64) -> Self {
        self.op.pagination = self.op.pagination.take(n);
        self
    }

    /// Select specific fields.
    pub fn select(mut self, select: impl Into<Select>) -> Self {
        self.op = self.op.select(select.into());
        self
    }

    /// The operation built so far.
    pub fn operation(&self) -> &Operation {
        &self.op
    }

    /// Execute the query.
    pub async fn exec(self) -> QueryResult<Vec<Document>> {
        Ok(self.planner.execute(self.op).await?.into_documents())
    }
}
