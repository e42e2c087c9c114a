//! Error types for the keyword tagging engine.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed driver diagnostic attached to sink failures.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for tagging and persistence operations.
#[derive(Debug, Error)]
pub enum TaggerError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Empty file or no header to work with.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Invalid argument shape detected at an API boundary.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid sink or job configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A driver or database file referenced by the configuration is missing.
    #[error("Resource not found: '{path}'")]
    ResourceNotFound { path: PathBuf },

    /// A cell could not be converted to the sink type declared for its column.
    #[error("Cannot coerce row {row}, column '{column}': {message}")]
    Coercion {
        row: usize,
        column: String,
        message: String,
    },

    /// The underlying driver rejected a connect, statement, or commit.
    #[error("Sink write failed during {context}: {source}")]
    SinkWrite {
        context: String,
        #[source]
        source: DriverError,
    },
}

impl TaggerError {
    /// Wrap a driver error with the step it happened in.
    pub fn sink_write(
        context: impl Into<String>,
        source: impl Into<DriverError>,
    ) -> Self {
        TaggerError::SinkWrite {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Result type alias for tagging operations.
pub type Result<T> = std::result::Result<T, TaggerError>;
