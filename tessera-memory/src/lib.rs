//! # tessera-memory
//!
//! In-memory [`DataStoreDriver`](tessera_query::DataStoreDriver) for Tessera.
//!
//! This crate provides:
//! - Collections of documents keyed by record id, in insertion order
//! - Generated ids (UUID v4) for documents stored without one
//! - Unique field constraints reported as constraint violations
//! - Scopes that snapshot a collection and restore it on rollback
//! - Per-path collation defaults
//! - Fault injection for exercising error paths
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tessera_memory::{MemoryConfig, MemoryDriver};
//! use tessera_query::{doc, Filter, QueryPlanner, Schema};
//!
//! # tokio_test(async {
//! let driver = MemoryDriver::new(MemoryConfig::new().unique("users", "email"));
//! driver.seed("users", vec![
//!     doc! { "id" => "u1", "email" => "alice@example.com" },
//!     doc! { "id" => "u2", "email" => "bob@example.com" },
//! ]);
//!
//! let planner = QueryPlanner::new(Arc::new(driver), Arc::new(Schema::new()));
//! let found = planner
//!     .find_many("users")
//!     .r#where(Filter::ends_with("email", "@example.com"))
//!     .exec()
//!     .await
//!     .unwrap();
//! assert_eq!(found.len(), 2);
//! # });
//! # fn tokio_test<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod config;
pub mod driver;

pub use config::MemoryConfig;
pub use driver::{Call, MemoryDriver};
