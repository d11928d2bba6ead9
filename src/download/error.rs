//! Error types for the download module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while driving the external download tool.
///
/// Remote failures are not errors: they are reported through
/// [`DownloadOutcome`](super::DownloadOutcome). These variants cover the cases
/// where the tool could not be run at all.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The tool binary could not be started.
    #[error("failed to run download tool '{program}' for {url}: {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// The URL being downloaded.
        url: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The directory for downloads or logs could not be prepared.
    #[error("IO error preparing {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates a spawn error.
    pub fn spawn(program: impl Into<String>, url: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            url: url.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
