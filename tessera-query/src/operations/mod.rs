//! Fluent builders for planner operations.
//!
//! - `FindManyOperation` - Find every matching document
//! - `FindFirstOperation` - Find the first matching document
//! - `CreateOperation` - Create a new record
//! - `UpdateManyOperation` - Update every matching document
//! - `DeleteManyOperation` - Delete every matching document
//!
//! Each builder assembles an [`Operation`](crate::planner::Operation) and
//! runs it with [`QueryPlanner::execute`](crate::planner::QueryPlanner::execute).

mod create;
mod delete;
mod find_first;
mod find_many;
mod update;

pub use create::CreateOperation;
pub use delete::DeleteManyOperation;
pub use find_first::FindFirstOperation;
pub use find_many::FindManyOperation;
pub use update::UpdateManyOperation;
