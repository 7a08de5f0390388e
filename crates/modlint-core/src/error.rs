//! Error types for schema loading, configuration and autofix operations
//!
//! Problems found *in mod files* are never errors of this type: they are
//! reported as [`ValidationMessage`](crate::diagnostics::ValidationMessage)s.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for modlint operations
#[derive(Debug, Error)]
pub enum ModlintError {
    /// Schema data is malformed or inconsistent (startup-fatal)
    #[error("Schema error: {message}")]
    SchemaError { message: String },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON documents that fail to deserialize
    #[error("Invalid JSON in '{path}': {source}")]
    JsonError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Correction application errors
    #[error("Autofix error: {message}")]
    AutofixError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    Config,
    Io,
    Autofix,
}

impl ModlintError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModlintError::SchemaError { .. } | ModlintError::JsonError { .. } => ErrorKind::Schema,
            ModlintError::ConfigError { .. } => ErrorKind::Config,
            ModlintError::IoError { .. } => ErrorKind::Io,
            ModlintError::AutofixError { .. } => ErrorKind::Autofix,
        }
    }

    /// Check if this error is recoverable (can continue processing other files)
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Io | ErrorKind::Autofix)
    }

    /// Create a schema error
    pub fn schema_error(message: impl Into<String>) -> Self {
        Self::SchemaError {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create a JSON error with path context
    pub fn json_error(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::JsonError {
            path: path.into(),
            source,
        }
    }

    /// Create an autofix error
    pub fn autofix_error(message: impl Into<String>) -> Self {
        Self::AutofixError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ModlintError::schema_error("bad").kind(),
            ErrorKind::Schema
        );
        assert_eq!(
            ModlintError::config_error("bad").kind(),
            ErrorKind::Config
        );
        let io = ModlintError::io_error(
            "mods/a.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(io.kind(), ErrorKind::Io);
        assert!(io.is_recoverable());
        assert!(!ModlintError::schema_error("bad").is_recoverable());

        let autofix = ModlintError::autofix_error("position 9:0 is outside the text");
        assert_eq!(autofix.kind(), ErrorKind::Autofix);
        assert!(autofix.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = ModlintError::schema_error("unknown category 'weird'");
        assert_eq!(
            err.to_string(),
            "Schema error: unknown category 'weird'"
        );
    }
}
