//! The boundary to the external data store.
//!
//! A [`DataStoreDriver`] fetches, persists and removes whole top-level
//! documents. It may use the filter passed to [`DataStoreDriver::fetch`] as a
//! pushdown hint, but the planner re-checks every returned document, so a
//! driver that ignores the hint is still correct.
//!
//! Write operations touching several documents are bracketed by a scope
//! (`begin_scope` / `commit_scope` / `rollback_scope`). What a scope
//! guarantees is up to the driver; the default implementation does nothing.

use async_trait::async_trait;
use thiserror::Error;

use crate::collation::Collation;
use crate::document::Document;
use crate::error::QueryError;
use crate::filter::Filter;
use crate::value::RecordId;

/// Result type for driver calls.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors reported by a data store driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// The addressed record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The store could not be reached. Callers may retry.
    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    /// A store-level constraint rejected the write.
    #[error("constraint violation on {field}: {message}")]
    ConstraintViolation {
        /// Field or index the constraint applies to.
        field: String,
        /// Driver message.
        message: String,
    },

    /// Any other driver failure.
    #[error("driver error: {0}")]
    Internal(String),
}

impl DriverError {
    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a connection failure.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionFailure(message.into())
    }

    /// Create a constraint violation.
    pub fn constraint(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a connection failure.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectionFailure(_))
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<DriverError> for QueryError {
    fn from(err: DriverError) -> Self {
        let mapped = match &err {
            DriverError::NotFound(what) => QueryError::not_found(what.clone()),
            DriverError::ConnectionFailure(msg) => QueryError::connection(msg.clone()),
            DriverError::ConstraintViolation { field, message } => {
                QueryError::constraint_violation(message.clone()).with_field(field.clone())
            }
            DriverError::Internal(msg) => QueryError::internal(msg.clone()),
        };
        mapped.with_source(err)
    }
}

/// Opaque handle for a driver scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeHandle(pub u64);

/// A data store the planner reads from and writes to.
#[async_trait]
pub trait DataStoreDriver: Send + Sync {
    /// Fetch the documents of a collection.
    ///
    /// `hint` is the operation's filter; drivers may use it to narrow the
    /// result or ignore it and return everything.
    async fn fetch(&self, collection: &str, hint: Option<&Filter>) -> DriverResult<Vec<Document>>;

    /// Insert or replace a top-level document and return it as stored.
    async fn persist(&self, collection: &str, document: Document) -> DriverResult<Document>;

    /// Remove a top-level document and everything nested in it.
    async fn remove(&self, collection: &str, id: &RecordId) -> DriverResult<()>;

    /// The store's default collation for a dotted field path.
    fn collation(&self, _collection: &str, _path: &str) -> Collation {
        Collation::CaseSensitive
    }

    /// Open a scope around the writes of one top-level operation.
    async fn begin_scope(&self, _collection: &str) -> DriverResult<ScopeHandle> {
        Ok(ScopeHandle(0))
    }

    /// Make the scope's writes final.
    async fn commit_scope(&self, _scope: ScopeHandle) -> DriverResult<()> {
        Ok(())
    }

    /// Discard the scope's writes.
    async fn rollback_scope(&self, _scope: ScopeHandle) -> DriverResult<()> {
        Ok(())
    }
}
