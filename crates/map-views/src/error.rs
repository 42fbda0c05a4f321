//! Error types for loading map views.

use choropleth_core::CoreError;
use indicator_data::DataError;
use thiserror::Error;

/// Errors that can occur while fetching documents or assembling views.
#[derive(Debug, Error)]
pub enum ViewError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("No se pudo leer {location} (HTTP {status})")]
    Status { location: String, status: u16 },

    /// A local document could not be read.
    #[error("No se pudo leer {location}: {error}")]
    Io {
        location: String,
        #[source]
        error: std::io::Error,
    },

    /// A document is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A dataset has an unexpected shape.
    #[error("Dataset error: {0}")]
    Data(#[from] DataError),

    /// Alias tables or colors could not be loaded.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// No document sources were configured.
    #[error("No sources configured for {0}")]
    NoSources(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Configuration(String),
}
