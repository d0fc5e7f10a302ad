//! DeleteMany operation for removing documents.

use crate::driver::DataStoreDriver;
use crate::error::QueryResult;
use crate::filter::Filter;
use crate::planner::{Operation, OperationKind, QueryPlanner};

/// A delete operation removing every matching document.
///
/// Nested documents go with their parent; references to the removed
/// records held elsewhere are left alone.
///
/// # Example
///
/// ```rust,ignore
/// let deleted = planner
///     .delete_many("users")
///     .r#where(Filter::is_set("address", false))
///     .exec()
///     .await?;
/// ```
pub struct DeleteManyOperation<'a, D: DataStoreDriver> {
    planner: &'a QueryPlanner<D>,
    op: Operation,
}

impl<'a, D: DataStoreDriver> DeleteManyOperation<'a, D> {
    /// Create a new DeleteMany operation.
    pub fn new(planner: &'a QueryPlanner<D>, collection: impl Into<String>) -> Self {
        Self {
            planner,
            op: Operation::new(OperationKind::Delete, collection),
        }
    }

    /// Add a filter condition.
    pub fn r#where(mut self, filter: impl Into<Filter>) -> Self {
        self.op = self.op.filter(filter.into());
        self
    }

    /// Execute the delete and return the number of removed documents.
    pub async fn exec(self) -> QueryResult<u64> {
        Ok(self.planner.execute(self.op).await?.count())
    }
}
