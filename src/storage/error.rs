//! Storage-specific error types.

use thiserror::Error;

/// Errors that can occur in the metric storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Metric descriptor creation or registry operation failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Encoded exposition is not valid UTF-8.
    #[error("encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
