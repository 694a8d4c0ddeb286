//! Error types for survey-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in survey-core
///
/// Per-cell problems (malformed blobs, bad dates, non-numeric values) are never
/// errors; they degrade to empty or missing values. Only structural problems
/// with a whole table or file surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse CSV
    #[error("failed to parse CSV '{path}': {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Required columns are absent from a table's header
    #[error("table '{table}' is missing required column(s): {}", columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    /// Block parser name not recognised
    #[error("unknown block kind: {0}")]
    UnknownBlockKind(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a single missing column
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::MissingColumns {
            table: table.into(),
            columns: vec![column.into()],
        }
    }
}
