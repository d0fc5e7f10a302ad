//! # tessera-query
//!
//! Filter and mutation language for composite embedded documents.
//!
//! This crate provides:
//! - A [`Value`] / [`Document`] model where an absent field (`Unset`) is
//!   distinct from an explicit `Null`
//! - Composite filters (`is`, `isNot`, `isSet`, `every`, `some`, `none`,
//!   `isEmpty`) over single and list-valued embedded documents
//! - Collation-aware string comparison with per-path defaults
//! - Composite mutations (`set`, `unset`, `update`, `upsert`, `push`,
//!   `updateMany`, `deleteMany`) checked against a [`Schema`]
//! - A [`QueryPlanner`] that runs find, create, update and delete
//!   operations over any [`DataStoreDriver`]
//!
//! ## Filters
//!
//! ```rust
//! use tessera_query::{doc, Collation, Evaluator, Filter};
//!
//! let user = doc! {
//!     "name" => "Alice",
//!     "address" => doc! { "street" => "555 Candy Cane Lane", "city" => "Wonderland" },
//! };
//!
//! let eval = Evaluator::new(&Collation::CaseSensitive);
//! let filter = Filter::is("address", Filter::eq("street", "555 candy cane lane").insensitive());
//! assert!(eval.matches(&user, &filter).unwrap());
//!
//! // `isSet: false` matches documents without the field
//! assert!(!eval.matches(&user, &Filter::is_set("address", false)).unwrap());
//! ```
//!
//! ## Sorting
//!
//! ```rust
//! use tessera_query::{NullsOrder, OrderBy, OrderByField};
//!
//! let orders = OrderBy::Field(OrderByField::asc("name"))
//!     .then(OrderByField::desc("created_at").nulls(NullsOrder::First));
//! assert_eq!(orders.fields().len(), 2);
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use tessera_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::required_field("Address", "street");
//! assert_eq!(err.code, ErrorCode::RequiredFieldViolation);
//! assert!(!err.is_retryable());
//! ```

#[macro_use]
pub mod macros;

pub mod collation;
pub mod config;
pub mod document;
pub mod driver;
pub mod error;
pub mod eval;
pub mod filter;
pub mod logging;
pub mod mutation;
pub mod operations;
pub mod pagination;
pub mod planner;
pub mod schema;
pub mod types;
pub mod value;

#[cfg(test)]
mod test_support;

pub use collation::{Collation, CollationMap, CollationResolver, equals_ignoring_case};
pub use config::{CollationSettings, ConfigError, ConfigResult, TesseraConfig};
pub use document::Document;
pub use driver::{DataStoreDriver, DriverError, DriverResult, ScopeHandle};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult, Suggestion};
pub use eval::Evaluator;
pub use filter::{CompareOp, Condition, Filter};
pub use mutation::{Applicator, Mutation, NumericOp, UpdateData};
pub use operations::{
    CreateOperation, DeleteManyOperation, FindFirstOperation, FindManyOperation,
    UpdateManyOperation,
};
pub use pagination::Pagination;
pub use planner::{Operation, OperationKind, OperationOutput, PlannerConfig, QueryPlanner};
pub use schema::{FieldDef, FieldType, ScalarType, Schema, TypeDef, TypeKind, TypeModifier};
pub use types::{NullsOrder, OrderBy, OrderByField, Select, SortOrder};
pub use value::{RecordId, Value};

// Re-export logging utilities
pub use logging::{LogFormat, init as init_logging, is_debug_enabled, log_format, log_level};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::collation::{Collation, CollationResolver};
    pub use crate::document::Document;
    pub use crate::driver::{DataStoreDriver, DriverError, DriverResult};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::{CompareOp, Filter};
    pub use crate::mutation::{Mutation, UpdateData};
    pub use crate::operations::*;
    pub use crate::pagination::Pagination;
    pub use crate::planner::{PlannerConfig, QueryPlanner};
    pub use crate::schema::{FieldType, ScalarType, Schema, TypeDef, TypeModifier};
    pub use crate::types::{NullsOrder, OrderBy, OrderByField, Select, SortOrder};
    pub use crate::value::{RecordId, Value};
    pub use crate::{and_filter, doc, filter, not_filter, or_filter};
}
