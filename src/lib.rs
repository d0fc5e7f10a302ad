//! # Tessera
//!
//! Filters and mutations for composite embedded documents.
//!
//! Tessera provides:
//! - A filter language for nested and list-valued embedded documents
//! - Schema-checked mutations for the same documents
//! - Collation-aware string comparison
//! - A query planner over any data store driver
//! - An in-memory driver (feature `memory`, enabled by default)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tessera::prelude::*;
//! use tessera::memory::{MemoryConfig, MemoryDriver};
//!
//! let schema = Schema::new()
//!     .with_type(
//!         TypeDef::model("Product")
//!             .field("id", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
//!             .field("photos", FieldType::Composite("Photo".into()), TypeModifier::List),
//!     )
//!     .with_type(
//!         TypeDef::composite("Photo")
//!             .field("url", FieldType::Scalar(ScalarType::String), TypeModifier::Required)
//!             .field("height", FieldType::Scalar(ScalarType::Int), TypeModifier::Required),
//!     );
//!
//! let planner = QueryPlanner::new(Arc::new(MemoryDriver::default()), Arc::new(schema));
//!
//! let trimmed = planner
//!     .update_many("products", "Product")
//!     .field("photos", Mutation::DeleteMany(Filter::eq("height", 100)))
//!     .exec()
//!     .await?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Filters, mutations and the query planner.
pub mod query {
    pub use tessera_query::*;
}

/// In-memory data store driver.
#[cfg(feature = "memory")]
pub mod memory {
    pub use tessera_memory::*;
}

pub use tessera_query::{and_filter, doc, filter, not_filter, or_filter};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tessera_query::prelude::*;
}

// Re-export key types at the crate root
pub use tessera_query::{
    Collation, DataStoreDriver, Document, Filter, Mutation, QueryError, QueryPlanner,
    QueryResult, Schema, TesseraConfig, UpdateData, Value,
};
