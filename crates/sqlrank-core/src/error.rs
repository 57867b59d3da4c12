//! Error types for sqlrank.
//!
//! Compilation itself only fails on bad configuration (malformed admission
//! patterns, missing columns). The remaining variants come from the SQLite
//! helpers and from loading configuration files.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the sqlrank library.
#[derive(Debug, Error)]
pub enum SearchError {
    // Configuration errors
    #[error("Invalid admission pattern {pattern:?} for column {column}: {source}")]
    InvalidPattern {
        column: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

/// Result type alias for sqlrank operations.
pub type Result<T> = std::result::Result<T, SearchError>;

impl From<std::io::Error> for SearchError {
    fn from(err: std::io::Error) -> Self {
        SearchError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(err: rusqlite::Error) -> Self {
        SearchError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl SearchError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        SearchError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        SearchError::Config {
            message: message.into(),
        }
    }

    /// Whether the error stems from the caller's search configuration rather
    /// than from the environment (database, filesystem).
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidPattern { .. }
                | SearchError::Config { .. }
                | SearchError::Validation { .. }
                | SearchError::Json { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SearchError::config("no searchable columns for users");
        assert_eq!(
            err.to_string(),
            "Configuration error: no searchable columns for users"
        );
    }

    #[test]
    fn test_invalid_pattern_display() {
        let source = regex::Regex::new("[a-").unwrap_err();
        let err = SearchError::InvalidPattern {
            column: "users.name".into(),
            pattern: "[a-".into(),
            source,
        };
        let message = err.to_string();
        assert!(message.starts_with("Invalid admission pattern \"[a-\" for column users.name"));
    }

    #[test]
    fn test_config_classification() {
        assert!(SearchError::config("x").is_config_error());
        assert!(SearchError::Validation {
            field: "weight".into(),
            message: "must be positive".into(),
        }
        .is_config_error());
        assert!(!SearchError::Database {
            message: "locked".into(),
            source: None,
        }
        .is_config_error());
    }

    #[test]
    fn test_io_with_path() {
        let err = SearchError::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            "/tmp/search.json",
        );
        match err {
            SearchError::Io { path, .. } => {
                assert_eq!(path, Some(PathBuf::from("/tmp/search.json")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
