//! Error types for the dimension index.

use thiserror::Error;

use crate::types::Dimension;

/// Errors raised by a reader resource (opening or releasing a remote dataset).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReaderError {
    /// The remote dataset could not be opened.
    #[error("failed to open dataset {dataset}: {message}")]
    OpenFailed { dataset: String, message: String },

    /// Releasing the dataset's resources failed.
    #[error("failed to close dataset handle: {0}")]
    CloseFailed(String),

    /// Underlying I/O failure.
    #[error("reader I/O error: {0}")]
    Io(String),
}

impl ReaderError {
    pub fn open_failed(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OpenFailed {
            dataset: dataset.into(),
            message: message.into(),
        }
    }

    pub fn close_failed(message: impl Into<String>) -> Self {
        Self::CloseFailed(message.into())
    }
}

impl From<std::io::Error> for ReaderError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// One dataset whose handle failed to close.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseFailure {
    pub dataset: String,
    pub error: ReaderError,
}

/// Errors that can occur while registering or querying dimension data.
#[derive(Error, Debug)]
pub enum DimensionError {
    /// The dataset key carries a query component.
    #[error("the dataset must be provided without a query: {0}")]
    InvalidDatasetKey(String),

    /// Nothing was registered under the key.
    #[error("no dimension data has been fetched for dataset {0}")]
    DatasetNotRegistered(String),

    /// The dataset exists but has no such axis.
    #[error("dataset {dataset} does not have a {dimension} dimension")]
    MissingDimension { dataset: String, dimension: Dimension },

    /// A second registration under the same key.
    #[error("already stored dimension data for dataset {0}")]
    AlreadyRegistered(String),

    /// A registered axis has no coordinates.
    #[error("dataset {dataset} has an empty {dimension} dimension")]
    EmptyDimension { dataset: String, dimension: Dimension },

    /// A longitude window that wraps across the antimeridian.
    #[error("dataset {dataset}: longitude window {west}..{east} crosses the antimeridian")]
    WrappedLongitude { dataset: String, west: f64, east: f64 },

    /// One or more handles failed to close. `source` is the first failure;
    /// the remaining ones are kept in `suppressed`.
    #[error("failed to close dataset {dataset}: {source} ({} further failures)", .suppressed.len())]
    Close {
        dataset: String,
        #[source]
        source: ReaderError,
        suppressed: Vec<CloseFailure>,
    },
}

impl DimensionError {
    /// True for caller mistakes (bad key, wrong lifecycle order) as opposed
    /// to resource failures.
    pub fn is_precondition_violation(&self) -> bool {
        !matches!(self, DimensionError::Close { .. })
    }

    pub(crate) fn missing_dimension(dataset: &str, dimension: Dimension) -> Self {
        Self::MissingDimension {
            dataset: dataset.to_string(),
            dimension,
        }
    }

    /// Build the aggregated close error from failures in the order they
    /// happened. Returns `None` when nothing failed.
    pub(crate) fn from_close_failures(mut failures: Vec<CloseFailure>) -> Option<Self> {
        if failures.is_empty() {
            return None;
        }
        let first = failures.remove(0);
        Some(Self::Close {
            dataset: first.dataset,
            source: first.error,
            suppressed: failures,
        })
    }
}

/// Result type for dimension index operations.
pub type Result<T> = std::result::Result<T, DimensionError>;
