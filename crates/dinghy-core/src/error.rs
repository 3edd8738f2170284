//! Error types and handling for Dinghy operations

use std::path::PathBuf;
use thiserror::Error;

/// Standard Result type for Dinghy operations
pub type Result<T> = std::result::Result<T, DinghyError>;

/// Main error type for Dinghy operations
#[derive(Debug, Error)]
pub enum DinghyError {
    /// Unrecoverable parse failure for a whole file
    #[error("Parse error: {message} at line {line}, column {column}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// A repair could not be applied to the live tree
    #[error("Repair error in '{rule_id}': {message}")]
    RepairError { rule_id: String, message: String },

    /// A tree operation referenced a node in an invalid state
    #[error("Tree error: {message}")]
    TreeError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Config,
    Repair,
    Tree,
    Io,
}

impl DinghyError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DinghyError::ParseError { .. } => ErrorKind::Parse,
            DinghyError::ConfigError { .. } => ErrorKind::Config,
            DinghyError::RepairError { .. } => ErrorKind::Repair,
            DinghyError::TreeError { .. } => ErrorKind::Tree,
            DinghyError::IoError { .. } => ErrorKind::Io,
        }
    }

    /// Create a parse error
    pub fn parse_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::ParseError {
            message: message.into(),
            line,
            column,
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a repair error
    pub fn repair_error(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RepairError {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// Create a tree error
    pub fn tree_error(message: impl Into<String>) -> Self {
        Self::TreeError {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            DinghyError::parse_error("bad", 1, 2).kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            DinghyError::repair_error("rule", "stale").kind(),
            ErrorKind::Repair
        );
        assert_eq!(
            DinghyError::config_error("missing").kind(),
            ErrorKind::Config
        );
    }

    #[test]
    fn test_io_error_names_the_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = DinghyError::io_error("Dockerfile", io);
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.to_string(), "IO error for path 'Dockerfile': gone");
    }

    #[test]
    fn test_display() {
        let err = DinghyError::repair_error("curlUseFlagF", "no http:// URL to rewrite");
        assert_eq!(
            err.to_string(),
            "Repair error in 'curlUseFlagF': no http:// URL to rewrite"
        );
    }
}
