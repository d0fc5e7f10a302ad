//! FindFirst operation for querying the first matching document.

use crate::document::Document;
use crate::driver::DataStoreDriver;
use crate::error::QueryResult;
use crate::filter::Filter;
use crate::pagination::Pagination;
use crate::planner::{Operation, OperationKind, QueryPlanner};
use crate::types::{OrderBy, Select};

/// A query operation that finds the first document matching the filter.
///
/// # Example
///
/// ```rust,ignore
/// let user = planner
///     .find_first("users")
///     .r#where(Filter::eq("email", "alice@example.com").insensitive())
///     .order_by(OrderByField::desc("created_at"))
///     .exec()
///     .await?;
/// ```
pub struct FindFirstOperation<'a, D: DataStoreDriver> {
    planner: &'a QueryPlanner<D>,
    op: Operation,
}

impl<'a, D: DataStoreDriver> FindFirstOperation<'a, D> {
    /// Create a new FindFirst operation.
    pub fn new(planner: &'a QueryPlanner<D>, collection: impl Into<String>) -> Self {
        Self {
            planner,
            op: Operation::new(OperationKind::Find, collection).pagination(Pagination::first(1)),
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

    /// Select specific fields.
    pub fn select(mut self, select: impl Into<Select>) -> Self {
        self.op = self.op.select(select.into());
        self
    }

    /// Execute the query.
    pub async fn exec(self) -> QueryResult<Option<Document>> {
        let docs = self.planner.execute(self.op).await?.into_documents();
        Ok(docs.into_iter().next())
    }
}
