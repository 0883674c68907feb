//! Query engine errors.

use sift_sdk::{EntityType, Operation};
use thiserror::Error;

/// Errors raised while registering fields or compiling and running a query.
///
/// Every variant except [`QueryError::Store`] is a configuration error: the
/// request (or the field catalog) is invalid, and retrying will not help.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("missing filter value for field: {field}")]
    MissingValue { field: String },

    #[error("{op} on field '{field}' needs at least {expected} values, got {actual}")]
    InsufficientValues {
        field: String,
        op: Operation,
        expected: usize,
        actual: usize,
    },

    #[error("invalid year '{value}' for field: {field}")]
    InvalidYear { field: String, value: String },

    #[error("year range {start}..={end} on field '{field}' spans more than {max} years")]
    YearRangeTooWide {
        field: String,
        start: i32,
        end: i32,
        max: i64,
    },

    #[error("field '{field}' has entity type {declared} but was registered for {target}")]
    EntityTypeMismatch {
        field: String,
        declared: EntityType,
        target: EntityType,
    },

    #[error("store error")]
    Store(#[source] anyhow::Error),
}

impl QueryError {
    /// Whether the error describes an invalid request rather than a failure.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, QueryError::Store(_))
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
