//! Error types for query construction.

use thiserror::Error;

use crate::bbox::BboxParseError;
use crate::time::TimeParseError;

/// Result type alias using QueryError.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while building or parsing a query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid range for '{axis}': {message}")]
    InvalidRange { axis: &'static str, message: String },

    #[error("Dataset must be given without a query component: {0}")]
    InvalidDatasetKey(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(#[from] TimeParseError),

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(#[from] BboxParseError),
}

impl QueryError {
    pub(crate) fn invalid_range(axis: &'static str, message: impl Into<String>) -> Self {
        QueryError::InvalidRange {
            axis,
            message: message.into(),
        }
    }
}
