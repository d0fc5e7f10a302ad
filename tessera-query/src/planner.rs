//! The query planner: runs top-level operations against a data store.
//!
//! Every operation follows the same pipeline: fetch candidates from the
//! driver, re-check them with the [`Evaluator`], then either return them
//! (find), compute new documents with the [`Applicator`] and persist them
//! (create, update), or remove them (delete). Writes of update and delete run
//! inside a driver scope that is rolled back on the first failure.
//!
//! ```rust,ignore
//! let planner = QueryPlanner::new(Arc::new(driver), Arc::new(schema));
//!
//! let updated = planner
//!     .update_many("users", "User")
//!     .r#where(Filter::is("address", Filter::eq("city", "Wonderland")))
//!     .data(UpdateData::new().update("address", UpdateData::new().set("zip", "52338")))
//!     .exec()
//!     .await?;
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::{debug, info, warn};

use crate::collation::{Collation, CollationResolver};
use crate::config::CollationSettings;
use crate::document::Document;
use crate::driver::{DataStoreDriver, ScopeHandle};
use crate::error::{QueryError, QueryResult};
use crate::eval::Evaluator;
use crate::filter::Filter;
use crate::mutation::{Applicator, UpdateData};
use crate::operations::{
    CreateOperation, DeleteManyOperation, FindFirstOperation, FindManyOperation,
    UpdateManyOperation,
};
use crate::pagination::Pagination;
use crate::schema::Schema;
use crate::types::{OrderBy, Select};

/// Planner settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Field holding record ids.
    pub id_field: SmolStr,
    /// Log every executed operation at info level instead of debug.
    pub log_operations: bool,
    /// Configured collations, consulted before the driver.
    pub collation: CollationSettings,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            id_field: SmolStr::new_static("id"),
            log_operations: false,
            collation: CollationSettings::default(),
        }
    }
}

impl PlannerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the id field.
    pub fn id_field(mut self, field: impl Into<SmolStr>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Enable or disable operation logging.
    pub fn log_operations(mut self, enabled: bool) -> Self {
        self.log_operations = enabled;
        self
    }

    /// Set the configured collations.
    pub fn collation(mut self, collation: CollationSettings) -> Self {
        self.collation = collation;
        self
    }
}

/// Kind of top-level operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Read matching documents.
    Find,
    /// Insert one new document.
    Create,
    /// Mutate every matching document.
    Update,
    /// Remove every matching document.
    Delete,
}

impl OperationKind {
    /// Operation name used in logs and error context.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Find => "find",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Descriptor of one top-level operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Operation kind.
    pub kind: OperationKind,
    /// Collection the driver stores the documents in.
    pub collection: String,
    /// Schema type of the documents; required for create and update.
    pub model: Option<String>,
    /// Documents the operation applies to.
    pub filter: Filter,
    /// Field mutations for create and update.
    pub data: Option<UpdateData>,
    /// Ordering of matched documents.
    pub order_by: OrderBy,
    /// Skip and take, applied after ordering.
    pub pagination: Pagination,
    /// Projection of returned documents.
    pub select: Select,
}

impl Operation {
    /// Create an operation that matches every document of a collection.
    pub fn new(kind: OperationKind, collection: impl Into<String>) -> Self {
        Self {
            kind,
            collection: collection.into(),
            model: None,
            filter: Filter::None,
            data: None,
            order_by: OrderBy::none(),
            pagination: Pagination::new(),
            select: Select::All,
        }
    }

    /// Set the schema type.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Add a filter condition.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = std::mem::take(&mut self.filter).and_then(filter);
        self
    }

    /// Set the field mutations.
    pub fn data(mut self, data: UpdateData) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the ordering.
    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.order_by = order.into();
        self
    }

    /// Set pagination.
    pub fn pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Set the projection.
    pub fn select(mut self, select: Select) -> Self {
        self.select = select;
        self
    }
}

/// Result of an executed operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutput {
    /// Documents read, created, or updated.
    Documents(Vec<Document>),
    /// Number of documents removed.
    Count(u64),
}

impl OperationOutput {
    /// Documents returned by the operation; empty for counts.
    pub fn into_documents(self) -> Vec<Document> {
        match self {
            Self::Documents(docs) => docs,
            Self::Count(_) => Vec::new(),
        }
    }

    /// Number of documents affected.
    pub fn count(&self) -> u64 {
        match self {
            Self::Documents(docs) => docs.len() as u64,
            Self::Count(n) => *n,
        }
    }
}

/// Collation for one collection: configured values first, then the driver.
struct ScopedCollation<'a, D: ?Sized> {
    settings: &'a CollationSettings,
    driver: &'a D,
    collection: &'a str,
}

impl<D: DataStoreDriver + ?Sized> CollationResolver for ScopedCollation<'_, D> {
    fn collation(&self, path: &str) -> Collation {
        self.settings
            .lookup(path)
            .unwrap_or_else(|| self.driver.collation(self.collection, path))
    }
}

/// Coordinates filter evaluation and mutation with a data store driver.
pub struct QueryPlanner<D: DataStoreDriver> {
    driver: Arc<D>,
    schema: Arc<Schema>,
    config: PlannerConfig,
}

impl<D: DataStoreDriver> Clone for QueryPlanner<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            schema: Arc::clone(&self.schema),
            config: self.config.clone(),
        }
    }
}

impl<D: DataStoreDriver> fmt::Debug for QueryPlanner<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryPlanner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<D: DataStoreDriver> QueryPlanner<D> {
    /// Create a planner with the default configuration.
    pub fn new(driver: Arc<D>, schema: Arc<Schema>) -> Self {
        Self {
            driver,
            schema,
            config: PlannerConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// The driver.
    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// The schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Start a find-many operation.
    pub fn find_many(&self, collection: impl Into<String>) -> FindManyOperation<'_, D> {
        FindManyOperation::new(self, collection)
    }

    /// Start a find-first operation.
    pub fn find_first(&self, collection: impl Into<String>) -> FindFirstOperation<'_, D> {
        FindFirstOperation::new(self, collection)
    }

    /// Start a create operation.
    pub fn create(
        &self,
        collection: impl Into<String>,
        model: impl Into<String>,
    ) -> CreateOperation<'_, D> {
        CreateOperation::new(self, collection, model)
    }

    /// Start an update-many operation.
    pub fn update_many(
        &self,
        collection: impl Into<String>,
        model: impl Into<String>,
    ) -> UpdateManyOperation<'_, D> {
        UpdateManyOperation::new(self, collection, model)
    }

    /// Start a delete-many operation.
    pub fn delete_many(&self, collection: impl Into<String>) -> DeleteManyOperation<'_, D> {
        DeleteManyOperation::new(self, collection)
    }

    /// Execute an operation.
    pub async fn execute(&self, op: Operation) -> QueryResult<OperationOutput> {
        if self.config.log_operations {
            info!(kind = %op.kind, collection = %op.collection, "executing operation");
        } else {
            debug!(
                kind = %op.kind,
                collection = %op.collection,
                filter = ?op.filter,
                "executing operation"
            );
        }

        let kind = op.kind;
        let collection = op.collection.clone();
        let result = match kind {
            OperationKind::Find => self.find(&op).await.map(OperationOutput::Documents),
            OperationKind::Create => self
                .create_record(&op)
                .await
                .map(|doc| OperationOutput::Documents(vec![doc])),
            OperationKind::Update => self.update(&op).await.map(OperationOutput::Documents),
            OperationKind::Delete => self.delete(&op).await.map(OperationOutput::Count),
        };

        result.map_err(|e| {
            debug!(kind = %kind, collection = %collection, error = %e, "operation failed");
            let e = match e.context.operation {
                Some(_) => e,
                None => e.with_context(kind.as_str()),
            };
            e.with_collection(collection)
        })
    }

    fn resolver<'a>(&'a self, collection: &'a str) -> ScopedCollation<'a, D> {
        ScopedCollation {
            settings: &self.config.collation,
            driver: self.driver.as_ref(),
            collection,
        }
    }

    // Attach bulk position and record id to an error.
    fn locate(&self, err: QueryError, index: usize, doc: &Document) -> QueryError {
        let err = err.at_index(index);
        match (&err.context.document_id, doc.record_id(&self.config.id_field)) {
            (None, Some(id)) => err.with_document_id(id),
            _ => err,
        }
    }

    fn require_data<'o>(&self, op: &'o Operation) -> QueryResult<(&'o str, &'o UpdateData)> {
        let model = op.model.as_deref().ok_or_else(|| {
            QueryError::invalid_parameter("model", format!("{} requires a model type", op.kind))
        })?;
        let data = op.data.as_ref().ok_or_else(|| {
            QueryError::invalid_parameter("data", format!("{} requires field data", op.kind))
        })?;
        Ok((model, data))
    }

    // Fetch, re-filter, order, and paginate.
    async fn matching(&self, op: &Operation) -> QueryResult<Vec<Document>> {
        let hint = (!op.filter.is_none()).then_some(&op.filter);
        let fetched = self.driver.fetch(&op.collection, hint).await?;
        let fetched_count = fetched.len();

        let resolver = self.resolver(&op.collection);
        let eval = Evaluator::new(&resolver);
        let mut matched = Vec::with_capacity(fetched.len());
        for (i, doc) in fetched.into_iter().enumerate() {
            let hit = eval
                .matches(&doc, &op.filter)
                .map_err(|e| self.locate(e, i, &doc))?;
            if hit {
                matched.push(doc);
            }
        }
        eval.sort(&mut matched, &op.order_by);

        debug!(
            collection = %op.collection,
            fetched = fetched_count,
            matched = matched.len(),
            "filtered candidates"
        );
        Ok(op.pagination.apply(matched))
    }

    async fn find(&self, op: &Operation) -> QueryResult<Vec<Document>> {
        let docs = self.matching(op).await?;
        Ok(docs.into_iter().map(|d| op.select.apply(d)).collect())
    }

    async fn create_record(&self, op: &Operation) -> QueryResult<Document> {
        let (model, data) = self.require_data(op)?;
        let resolver = self.resolver(&op.collection);
        let doc = Applicator::new(&self.schema, &resolver).apply(None, model, data)?;
        let stored = self.driver.persist(&op.collection, doc).await?;
        Ok(op.select.apply(stored))
    }

    async fn update(&self, op: &Operation) -> QueryResult<Vec<Document>> {
        let (model, data) = self.require_data(op)?;
        let targets = self.matching(op).await?;

        let resolver = self.resolver(&op.collection);
        let applicator = Applicator::new(&self.schema, &resolver);
        let mut updated = Vec::with_capacity(targets.len());
        for (i, doc) in targets.iter().enumerate() {
            let next = applicator
                .apply(Some(doc), model, data)
                .map_err(|e| self.locate(e, i, doc))?;
            updated.push(next);
        }

        let scope = self.driver.begin_scope(&op.collection).await?;
        let mut stored = Vec::with_capacity(updated.len());
        let mut failure = None;
        for (i, doc) in updated.into_iter().enumerate() {
            let id = doc.record_id(&self.config.id_field);
            match self.driver.persist(&op.collection, doc).await {
                Ok(doc) => stored.push(doc),
                Err(e) => {
                    let mut err = QueryError::from(e).at_index(i);
                    if let Some(id) = id {
                        err = err.with_document_id(id);
                    }
                    failure = Some(err);
                    break;
                }
            }
        }

        self.finish_scope(scope, failure).await?;
        Ok(stored.into_iter().map(|d| op.select.apply(d)).collect())
    }

    async fn delete(&self, op: &Operation) -> QueryResult<u64> {
        let targets = self.matching(op).await?;

        let mut ids = Vec::with_capacity(targets.len());
        for (i, doc) in targets.iter().enumerate() {
            let id = doc.record_id(&self.config.id_field).ok_or_else(|| {
                QueryError::invalid_parameter(
                    self.config.id_field.as_str(),
                    "document has no record id",
                )
                .at_index(i)
            })?;
            ids.push(id);
        }

        let scope = self.driver.begin_scope(&op.collection).await?;
        let mut removed = 0u64;
        let mut failure = None;
        for (i, id) in ids.into_iter().enumerate() {
            if let Err(e) = self.driver.remove(&op.collection, &id).await {
                failure = Some(QueryError::from(e).at_index(i).with_document_id(id));
                break;
            }
            removed += 1;
        }

        self.finish_scope(scope, failure).await?;
        Ok(removed)
    }

    async fn finish_scope(
        &self,
        scope: ScopeHandle,
        failure: Option<QueryError>,
    ) -> QueryResult<()> {
        match failure {
            None => Ok(self.driver.commit_scope(scope).await?),
            Some(err) => {
                if let Err(rollback) = self.driver.rollback_scope(scope).await {
                    warn!(error = %rollback, "rollback after failed write also failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::driver::{DriverError, DriverResult};
    use crate::error::ErrorCode;
    use crate::schema::{FieldType, ScalarType, TypeDef, TypeModifier};
    use crate::value::RecordId;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingDriver {
        docs: Vec<Document>,
        fail_persist_at: Option<usize>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DataStoreDriver for RecordingDriver {
        async fn fetch(
            &self,
            _collection: &str,
            _hint: Option<&Filter>,
        ) -> DriverResult<Vec<Document>> {
            self.calls.lock().push("fetch".into());
            Ok(self.docs.clone())
        }

        async fn persist(&self, _collection: &str, document: Document) -> DriverResult<Document> {
            let mut calls = self.calls.lock();
            let n = calls.iter().filter(|c| c.starts_with("persist")).count();
            calls.push(format!("persist:{}", n));
            if self.fail_persist_at == Some(n) {
                return Err(DriverError::connection("socket closed"));
            }
            Ok(document)
        }

        async fn remove(&self, _collection: &str, id: &RecordId) -> DriverResult<()> {
            self.calls.lock().push(format!("remove:{}", id));
            Ok(())
        }

        fn collation(&self, _collection: &str, path: &str) -> Collation {
            if path == "name" {
                Collation::CaseInsensitive
            } else {
                Collation::CaseSensitive
            }
        }

        async fn begin_scope(&self, _collection: &str) -> DriverResult<ScopeHandle> {
            self.calls.lock().push("begin".into());
            Ok(ScopeHandle(7))
        }

        async fn commit_scope(&self, scope: ScopeHandle) -> DriverResult<()> {
            self.calls.lock().push(format!("commit:{}", scope.0));
            Ok(())
        }

        async fn rollback_scope(&self, scope: ScopeHandle) -> DriverResult<()> {
            self.calls.lock().push(format!("rollback:{}", scope.0));
            Ok(())
        }
    }

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::new().with_type(
                TypeDef::model("User")
                    .field("id", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
                    .field("name", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
                    .field("age", FieldType::Scalar(ScalarType::Int), TypeModifier::Optional),
            ),
        )
    }

    fn driver() -> RecordingDriver {
        RecordingDriver {
            docs: vec![
                doc! { "id" => "u1", "name" => "Alice", "age" => 30 },
                doc! { "id" => "u2", "name" => "bob", "age" => 25 },
                doc! { "id" => "u3", "name" => "Carol" },
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_find_uses_driver_collation() {
        let planner = QueryPlanner::new(Arc::new(driver()), schema());
        let op = Operation::new(OperationKind::Find, "users").filter(Filter::eq("name", "ALICE"));
        let out = planner.execute(op).await.unwrap().into_documents();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("id").as_str(), Some("u1"));
    }

    #[tokio::test]
    async fn test_config_collation_beats_driver() {
        let config = PlannerConfig::new()
            .collation(CollationSettings::default().with_override("name", Collation::CaseSensitive));
        let planner = QueryPlanner::new(Arc::new(driver()), schema()).with_config(config);
        let op = Operation::new(OperationKind::Find, "users").filter(Filter::eq("name", "ALICE"));
        assert_eq!(planner.execute(op).await.unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_update_scope_commit() {
        let planner = QueryPlanner::new(Arc::new(driver()), schema());
        let op = Operation::new(OperationKind::Update, "users")
            .model("User")
            .filter(Filter::is_set("age", true))
            .data(UpdateData::new().increment("age", 1));
        let out = planner.execute(op).await.unwrap().into_documents();
        assert_eq!(out[0].get("age"), &crate::Value::Int(31));
        assert_eq!(out[1].get("age"), &crate::Value::Int(26));

        let calls = planner.driver().calls.lock().clone();
        assert_eq!(calls, vec!["fetch", "begin", "persist:0", "persist:1", "commit:7"]);
    }

    #[tokio::test]
    async fn test_update_failure_rolls_back_and_locates() {
        let driver = RecordingDriver {
            fail_persist_at: Some(1),
            ..driver()
        };
        let planner = QueryPlanner::new(Arc::new(driver), schema());
        let op = Operation::new(OperationKind::Update, "users")
            .model("User")
            .data(UpdateData::new().set("age", 40));
        let err = planner.execute(op).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ConnectionFailed);
        assert!(err.is_retryable());
        assert_eq!(err.context.document_index, Some(1));
        assert_eq!(err.context.document_id, Some(RecordId::from("u2")));
        assert_eq!(err.context.operation.as_deref(), Some("update"));
        assert_eq!(err.context.collection.as_deref(), Some("users"));

        let calls = planner.driver().calls.lock().clone();
        assert_eq!(calls.last().map(String::as_str), Some("rollback:7"));
        assert!(!calls.iter().any(|c| c.starts_with("commit")));
    }

    #[tokio::test]
    async fn test_mutation_error_has_no_writes() {
        let planner = QueryPlanner::new(Arc::new(driver()), schema());
        let op = Operation::new(OperationKind::Update, "users")
            .model("User")
            .data(UpdateData::new().unset("name"));
        let err = planner.execute(op).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredFieldViolation);
        assert_eq!(err.context.document_index, Some(0));
        assert_eq!(err.context.document_id, Some(RecordId::from("u1")));
        assert_eq!(planner.driver().calls.lock().clone(), vec!["fetch"]);
    }

    #[tokio::test]
    async fn test_delete_counts_and_commits() {
        let planner = QueryPlanner::new(Arc::new(driver()), schema());
        let op = Operation::new(OperationKind::Delete, "users").filter(Filter::is_set("age", false));
        let out = planner.execute(op).await.unwrap();
        assert_eq!(out, OperationOutput::Count(1));
        let calls = planner.driver().calls.lock().clone();
        assert_eq!(calls, vec!["fetch", "begin", "remove:u3", "commit:7"]);
    }

    #[tokio::test]
    async fn test_create_through_execute_and_builder() {
        let planner = QueryPlanner::new(Arc::new(driver()), schema());
        let op = Operation::new(OperationKind::Create, "users")
            .model("User")
            .data(UpdateData::new().set("id", "u4").set("name", "Dave"));
        let out = planner.execute(op).await.unwrap().into_documents();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("name").as_str(), Some("Dave"));

        let created = planner
            .create("users", "User")
            .set("id", "u5")
            .set("name", "Erin")
            .exec()
            .await
            .unwrap();
        assert_eq!(created.get("id").as_str(), Some("u5"));

        let calls = planner.driver().calls.lock().clone();
        assert_eq!(calls, vec!["persist:0", "persist:1"]);
    }

    #[tokio::test]
    async fn test_update_requires_model_and_data() {
        let planner = QueryPlanner::new(Arc::new(driver()), schema());
        let err = planner
            .execute(Operation::new(OperationKind::Update, "users").model("User"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameter);
    }
}
