//! Error types for the contact manager.
//!
//! This module defines custom error types using `thiserror` for precise error handling.

use std::fmt;
use thiserror::Error;

/// Category of a failed store operation.
///
/// Each category carries the generic message callers are allowed to see.
/// The underlying database error is logged where it happens and is never
/// part of the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreFailure {
    Retrieve,
    Add,
    Update,
    Remove,
    Exists,
    Count,
    Sum,
    Average,
    Maximum,
    Minimum,
    Transaction,
}

impl StoreFailure {
    /// The caller-facing message for this category.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Retrieve => "An error occurred while retrieving the data.",
            Self::Add => "An error occurred while adding the data.",
            Self::Update => "An error occurred while updating the data.",
            Self::Remove => "An error occurred while removing the data.",
            Self::Exists => "An error occurred while checking the existence of the data.",
            Self::Count => "An error occurred while counting the data.",
            Self::Sum => "An error occurred while calculating the sum.",
            Self::Average => "An error occurred while calculating the average.",
            Self::Maximum => "An error occurred while calculating the maximum.",
            Self::Minimum => "An error occurred while calculating the minimum.",
            Self::Transaction => "An error occurred while executing the transaction.",
        }
    }
}

impl fmt::Display for StoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Errors returned by the generic repository.
///
/// This is the failure side of the repository's result envelope: every
/// repository operation returns `RepositoryResult<T>` and never panics or
/// propagates a raw database error.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The caller passed an argument the operation cannot work with
    #[error("Invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    /// The underlying store failed
    #[error("{0}")]
    Store(StoreFailure),

    /// An entity with the same key is already stored
    #[error("An entity with the same key already exists.")]
    Conflict,

    /// A transactional operation reported its own failure and was rolled back
    #[error("Transaction aborted: {0}")]
    Aborted(String),
}

impl RepositoryError {
    /// Shorthand for an `InvalidArgument` error.
    pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// The store failure category, if this is a store failure.
    pub fn store_failure(&self) -> Option<StoreFailure> {
        match self {
            Self::Store(failure) => Some(*failure),
            _ => None,
        }
    }
}

/// Errors surfaced by the contact service.
///
/// Precondition failures (duplicate phone, missing contact) are not errors at
/// this level; they come back as `Ok(false)`.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A repository call failed while the service was performing `action`
    #[error("Error occurred while {action}")]
    Repository {
        action: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl ServiceError {
    /// The action that was being performed, e.g. "getting contacts".
    pub fn action(&self) -> &'static str {
        match self {
            Self::Repository { action, .. } => action,
        }
    }
}

/// Errors that can occur while reading an uploaded CSV file.
///
/// Malformed rows are not errors; they are reported as skipped rows.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The upload is not UTF-8 text
    #[error("CSV file is not valid UTF-8 text: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },

    /// Failed to load .env file
    #[error("Failed to load .env file: {0}")]
    DotenvError(String),
}

/// Convenience type alias for Results with RepositoryError
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Convenience type alias for Results with ServiceError
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Convenience type alias for Results with ImportError
pub type ImportResult<T> = Result<T, ImportError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
