//! Error types for archive handling.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while unpacking or listing archives.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// File system error while reading the archive or writing members.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The zip container could not be read or extracted.
    #[error("invalid zip archive {path}: {source}")]
    Zip {
        /// The archive path.
        path: PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// Decompression was disabled but the expected output is missing.
    ///
    /// The run was started under the assumption that archives had already
    /// been unpacked by an earlier run.
    #[error("decompression disabled but {archive} was never decompressed (missing {expected})")]
    NotDecompressed {
        /// The archive file name.
        archive: String,
        /// The output that should already exist.
        expected: String,
    },
}

impl ArchiveError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a zip error.
    pub fn zip(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Zip {
            path: path.into(),
            source,
        }
    }

    /// Creates a missing-output error.
    pub fn not_decompressed(archive: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::NotDecompressed {
            archive: archive.into(),
            expected: expected.into(),
        }
    }
}
