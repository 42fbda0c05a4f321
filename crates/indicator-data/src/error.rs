//! Error types for dataset loading.

use thiserror::Error;

/// Errors that can occur while reading an indicator dataset.
///
/// Individual malformed records are not errors; they are dropped and
/// counted. Only a payload that is not a dataset at all fails.
#[derive(Debug, Error)]
pub enum DataError {
    /// The payload is neither an array nor an object with a `data` array.
    #[error("unexpected dataset shape: {0}")]
    UnexpectedShape(String),

    /// The payload is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
