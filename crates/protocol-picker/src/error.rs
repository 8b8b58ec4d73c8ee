//! Protocol picker error types.

use dimension_index::{DimensionError, ReaderError};
use thiserror::Error;

/// Errors that can occur while choosing a protocol or building its request.
#[derive(Debug, Error)]
pub enum PickerError {
    /// No registered protocol can express the query.
    #[error("No suitable protocol for query on dataset {0}")]
    UnsupportedQuery(String),

    /// Composing the protocol-specific request produced an invalid URL.
    #[error("Translation failed for '{url}': {message}")]
    Translation { url: String, message: String },

    /// A protocol id that is not registered or configured.
    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    /// A second protocol registered under an existing id.
    #[error("Protocol already registered: {0}")]
    DuplicateProtocol(String),

    /// The external reader failed.
    #[error(transparent)]
    Reader(#[from] ReaderError),

    /// Dimension cache precondition or close failure.
    #[error(transparent)]
    Dimension(#[from] DimensionError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PickerError {
    pub fn translation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Translation {
            url: url.into(),
            message: message.into(),
        }
    }

    /// HTTP status code a service should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            PickerError::UnsupportedQuery(_) => 400,
            PickerError::Dimension(e) if e.is_precondition_violation() => 409,
            PickerError::Reader(_) => 502,
            PickerError::Translation { .. }
            | PickerError::UnknownProtocol(_)
            | PickerError::DuplicateProtocol(_)
            | PickerError::Dimension(_)
            | PickerError::Config(_) => 500,
        }
    }
}

/// Result type for protocol picker operations.
pub type Result<T> = std::result::Result<T, PickerError>;
