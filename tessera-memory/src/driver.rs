//! In-memory driver implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tessera_query::{
    Collation, CollationResolver, Condition, DataStoreDriver, Document, DriverError, DriverResult,
    Evaluator, Filter, RecordId, ScopeHandle, Value,
};
use tracing::{debug, trace};

use crate::config::MemoryConfig;

type Collection = IndexMap<RecordId, Document>;

/// Driver calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    /// [`DataStoreDriver::fetch`].
    Fetch,
    /// [`DataStoreDriver::persist`].
    Persist,
    /// [`DataStoreDriver::remove`].
    Remove,
    /// [`DataStoreDriver::begin_scope`].
    Begin,
    /// [`DataStoreDriver::commit_scope`].
    Commit,
}

#[derive(Debug)]
struct Fault {
    call: Call,
    skip: usize,
    error: DriverError,
}

#[derive(Debug)]
struct Scope {
    collection: String,
    snapshot: Option<Collection>,
}

/// A data store that keeps every collection in process memory.
///
/// Scopes snapshot the collection they were opened on; rolling back
/// restores the snapshot, committing discards it. Writes made by other
/// callers while a scope is open are lost on rollback.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    config: MemoryConfig,
    collections: RwLock<HashMap<String, Collection>>,
    scopes: Mutex<HashMap<u64, Scope>>,
    next_scope: AtomicU64,
    faults: Mutex<Vec<Fault>>,
}

impl MemoryDriver {
    /// Create an empty store.
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// The driver configuration.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Insert documents without constraint checks.
    ///
    /// Documents without an id get a generated one.
    pub fn seed(&self, collection: &str, docs: impl IntoIterator<Item = Document>) {
        let mut collections = self.collections.write();
        let coll = collections.entry(collection.to_string()).or_default();
        for doc in docs {
            let (id, doc) = self.with_id(doc);
            coll.insert(id, doc);
        }
    }

    /// All documents of a collection in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default()
    }

    /// One document by id.
    pub fn get(&self, collection: &str, id: &RecordId) -> Option<Document> {
        self.collections.read().get(collection)?.get(id).cloned()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections.read().get(collection).map_or(0, IndexMap::len)
    }

    /// Check if a collection has no documents.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Number of scopes opened and not yet finished.
    pub fn open_scopes(&self) -> usize {
        self.scopes.lock().len()
    }

    /// Make the next call of the given kind fail.
    pub fn fail_next(&self, call: Call, error: DriverError) {
        self.fail_after(call, 0, error);
    }

    /// Let `skip` calls of the given kind succeed, then fail the next one.
    pub fn fail_after(&self, call: Call, skip: usize, error: DriverError) {
        self.faults.lock().push(Fault { call, skip, error });
    }

    fn take_fault(&self, call: Call) -> DriverResult<()> {
        let mut faults = self.faults.lock();
        let Some(pos) = faults.iter().position(|f| f.call == call) else {
            return Ok(());
        };
        if faults[pos].skip > 0 {
            faults[pos].skip -= 1;
            return Ok(());
        }
        let fault = faults.remove(pos);
        debug!(call = ?call, error = %fault.error, "injected fault");
        Err(fault.error)
    }

    fn with_id(&self, mut doc: Document) -> (RecordId, Document) {
        if let Some(id) = doc.record_id(&self.config.id_field) {
            return (id, doc);
        }
        let id = RecordId::new(uuid::Uuid::new_v4().to_string());
        doc.insert(self.config.id_field.clone(), Value::String(id.to_string()));
        (id, doc)
    }

    fn check_unique(
        &self,
        collection: &str,
        coll: &Collection,
        id: &RecordId,
        doc: &Document,
    ) -> DriverResult<()> {
        for field in self.config.unique_in(collection) {
            let value = doc.get(field);
            if value.is_absent() {
                continue;
            }
            let taken = coll
                .iter()
                .any(|(other_id, other)| other_id != id && other.get(field) == value);
            if taken {
                return Err(DriverError::constraint(
                    field,
                    format!("duplicate value in unique field of {}", collection),
                ));
            }
        }
        Ok(())
    }
}

/// Whether a filter gives the same answer under every collation.
///
/// Only such filters are used to narrow fetch results; the planner decides
/// collations for the rest.
fn collation_free(filter: &Filter) -> bool {
    match filter {
        Filter::None => true,
        Filter::Field(_, condition) => match condition {
            Condition::Equals(value) | Condition::Compare { value, .. } => !has_string(value),
            Condition::Is(sub)
            | Condition::IsNot(sub)
            | Condition::Every(sub)
            | Condition::Some(sub)
            | Condition::None(sub) => collation_free(sub),
            Condition::IsSet(_) | Condition::IsEmpty(_) => true,
        },
        Filter::And(children) | Filter::Or(children) => children.iter().all(collation_free),
        Filter::Not(inner) => collation_free(inner),
    }
}

fn has_string(value: &Value) -> bool {
    match value {
        Value::String(_) | Value::Reference(_) => true,
        Value::List(items) => items.iter().any(has_string),
        Value::Document(doc) => doc.iter().any(|(_, v)| has_string(v)),
        _ => false,
    }
}

#[async_trait]
impl DataStoreDriver for MemoryDriver {
    async fn fetch(&self, collection: &str, hint: Option<&Filter>) -> DriverResult<Vec<Document>> {
        self.take_fault(Call::Fetch)?;
        let docs = self.documents(collection);

        let Some(hint) = hint.filter(|f| collation_free(f)) else {
            return Ok(docs);
        };
        let eval = Evaluator::new(&self.config.collation);
        let total = docs.len();
        // Evaluation errors are left for the planner to report.
        let narrowed: Vec<_> = docs
            .into_iter()
            .filter(|doc| !matches!(eval.matches(doc, hint), Ok(false)))
            .collect();
        trace!(collection, total, kept = narrowed.len(), "applied fetch hint");
        Ok(narrowed)
    }

    async fn persist(&self, collection: &str, document: Document) -> DriverResult<Document> {
        self.take_fault(Call::Persist)?;
        let (id, doc) = self.with_id(document);

        let mut collections = self.collections.write();
        let coll = collections.entry(collection.to_string()).or_default();
        self.check_unique(collection, coll, &id, &doc)?;
        debug!(collection, id = %id, replaced = coll.contains_key(&id), "persisted document");
        coll.insert(id, doc.clone());
        Ok(doc)
    }

    async fn remove(&self, collection: &str, id: &RecordId) -> DriverResult<()> {
        self.take_fault(Call::Remove)?;
        let mut collections = self.collections.write();
        let removed = collections
            .get_mut(collection)
            .and_then(|c| c.shift_remove(id));
        match removed {
            Some(_) => {
                debug!(collection, id = %id, "removed document");
                Ok(())
            }
            None => Err(DriverError::not_found(format!("{}/{}", collection, id))),
        }
    }

    fn collation(&self, _collection: &str, path: &str) -> Collation {
        self.config.collation.collation(path)
    }

    async fn begin_scope(&self, collection: &str) -> DriverResult<ScopeHandle> {
        self.take_fault(Call::Begin)?;
        let snapshot = self.collections.read().get(collection).cloned();
        let handle = self.next_scope.fetch_add(1, Ordering::Relaxed) + 1;
        self.scopes.lock().insert(
            handle,
            Scope {
                collection: collection.to_string(),
                snapshot,
            },
        );
        trace!(collection, scope = handle, "opened scope");
        Ok(ScopeHandle(handle))
    }

    async fn commit_scope(&self, scope: ScopeHandle) -> DriverResult<()> {
        self.take_fault(Call::Commit)?;
        self.scopes
            .lock()
            .remove(&scope.0)
            .map(|_| ())
            .ok_or_else(|| DriverError::internal(format!("unknown scope {}", scope.0)))
    }

    async fn rollback_scope(&self, scope: ScopeHandle) -> DriverResult<()> {
        let Some(Scope {
            collection,
            snapshot,
        }) = self.scopes.lock().remove(&scope.0)
        else {
            return Err(DriverError::internal(format!("unknown scope {}", scope.0)));
        };

        let mut collections = self.collections.write();
        match snapshot {
            Some(docs) => {
                collections.insert(collection.clone(), docs);
            }
            None => {
                collections.remove(&collection);
            }
        }
        debug!(collection = %collection, scope = scope.0, "rolled back scope");
        Ok(())
    }
}
