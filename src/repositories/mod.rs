//! Data access layer.
//!
//! A generic [`Repository`] over any [`Entity`], implemented on SQLite by
//! [`SqliteRepository`], plus the contact table mapping and schema setup.

mod contact_entity;
mod query;
pub mod schema;
mod sqlite_repository;
mod statements;
mod traits;
mod transaction;

pub use contact_entity::columns;
pub use query::{Assignment, Comparison, Condition, Filter, ListQuery, SqlValue};
pub use sqlite_repository::{SqliteRepository, DEFAULT_BATCH_SIZE};
pub use traits::{Entity, Repository};
pub use transaction::TransactionScope;
