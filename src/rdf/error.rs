//! Error types for RDF loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a file into a graph.
#[derive(Debug, Error)]
pub enum RdfError {
    /// The file could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The content is not valid in the chosen serialization.
    #[error("syntax error in {path}: {message}")]
    Syntax {
        /// The file path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

impl RdfError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a syntax error.
    pub fn syntax(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Syntax {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Short label recorded in the code column of the parse results.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io_error",
            Self::Syntax { .. } => "syntax_error",
        }
    }

    /// Message recorded in the type column of the parse results.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Io { source, .. } => source.to_string(),
            Self::Syntax { message, .. } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        let io = RdfError::io(
            "/data/a.ttl",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(io.kind(), "io_error");
        assert_eq!(io.detail(), "gone");

        let syntax = RdfError::syntax("/data/a.ttl", "unexpected end of file");
        assert_eq!(syntax.kind(), "syntax_error");
        assert!(syntax.to_string().contains("/data/a.ttl"));
    }
}
