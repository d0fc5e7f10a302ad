//! In-memory driver configuration.

use indexmap::{IndexMap, IndexSet};
use tessera_query::{Collation, CollationMap};

/// Configuration for a [`MemoryDriver`](crate::MemoryDriver).
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryConfig {
    /// Field holding record ids.
    pub id_field: String,
    /// Fields whose values must be distinct within a collection.
    pub unique_fields: IndexMap<String, IndexSet<String>>,
    /// Collation reported for field paths.
    pub collation: CollationMap,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            id_field: "id".to_string(),
            unique_fields: IndexMap::new(),
            collation: CollationMap::default(),
        }
    }
}

impl MemoryConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the id field.
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Declare a unique top-level field in a collection.
    pub fn unique(mut self, collection: impl Into<String>, field: impl Into<String>) -> Self {
        self.unique_fields
            .entry(collection.into())
            .or_default()
            .insert(field.into());
        self
    }

    /// Set the default collation.
    pub fn default_collation(mut self, collation: Collation) -> Self {
        self.collation.default = collation;
        self
    }

    /// Override the collation of a dotted path.
    pub fn collation_override(mut self, path: impl Into<String>, collation: Collation) -> Self {
        self.collation = self.collation.with_override(path, collation);
        self
    }

    /// Unique fields of a collection.
    pub fn unique_in(&self, collection: &str) -> impl Iterator<Item = &str> {
        self.unique_fields
            .get(collection)
            .into_iter()
            .flat_map(|fields| fields.iter().map(String::as_str))
    }
}
