//! In-process driver used by unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::document::Document;
use crate::driver::{DataStoreDriver, DriverResult};
use crate::filter::Filter;
use crate::value::RecordId;

/// Serves a fixed document list and records removals.
#[derive(Default)]
pub(crate) struct StaticDriver {
    docs: Vec<Document>,
    removed: Mutex<Vec<String>>,
}

impl StaticDriver {
    pub(crate) fn new(docs: Vec<Document>) -> Self {
        Self {
            docs,
            removed: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn removed(&self) -> Vec<String> {
        self.removed.lock().clone()
    }
}

#[async_trait]
impl DataStoreDriver for StaticDriver {
    async fn fetch(&self, _collection: &str, _hint: Option<&Filter>) -> DriverResult<Vec<Document>> {
        Ok(self.docs.clone())
    }

    async fn persist(&self, _collection: &str, document: Document) -> DriverResult<Document> {
        Ok(document)
    }

    async fn remove(&self, _collection: &str, id: &RecordId) -> DriverResult<()> {
        self.removed.lock().push(id.as_str().to_string());
        Ok(())
    }
}
