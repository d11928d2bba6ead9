//! Error types for result persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing run artifacts.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Directory creation or file access failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A results table could not be written or read.
    #[error("CSV error at {path}: {source}")]
    Csv {
        /// The table path.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// A JSON artifact could not be written or read.
    #[error("JSON error at {path}: {source}")]
    Json {
        /// The artifact path.
        path: PathBuf,
        /// The underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl OutputError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a CSV error.
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// Creates a JSON error.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
