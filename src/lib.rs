//! Contact Manager - a contact book service over SQLite.
//!
//! This library lists, creates, edits and deletes contact records (phone,
//! name, date of birth, marital status, salary), either one at a time or in
//! bulk from an uploaded CSV file.
//!
//! # Architecture
//!
//! - **domain**: Validated value objects for each contact field
//! - **models**: The contact record and its validation entry point
//! - **error**: Custom error types for precise error handling
//! - **config**: Configuration management from environment variables
//! - **import**: CSV parsing of bulk uploads
//! - **repositories**: Generic repository over SQLite with batching and transactions
//! - **services**: Contact business rules (uniqueness, existence)
//! - **server**: HTTP/JSON API

pub mod config;
pub mod domain;
pub mod error;
pub mod import;
pub mod models;
pub mod repositories;
pub mod server;
pub mod services;

pub use config::Config;
pub use error::{ConfigError, ImportError, RepositoryError, ServiceError, StoreFailure};
pub use import::{parse_contacts, CsvImport};
pub use models::{Contact, ValidationRules};
pub use repositories::{Filter, ListQuery, Repository, SqliteRepository};
pub use server::AppState;
pub use services::{ContactService, ContactServiceImpl};
