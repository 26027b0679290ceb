//! Error types for names, scanning, configuration and persistence.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when an identifier cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NameError {
    /// The text does not form a valid area or qualified name.
    #[error("Malformed name '{input}': {reason}")]
    Malformed { input: String, reason: String },

    /// The path does not name a known artifact file.
    #[error("Not an artifact file: {path}")]
    UnknownArtifact { path: PathBuf },
}

/// Errors that can occur during scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// No storage root of a scanner could be read.
    #[error("No readable root among {count} root(s)")]
    NoReadableRoot { count: usize },

    /// Every federation member failed to rescan.
    #[error("All {count} federation member(s) failed to rescan")]
    AllMembersFailed { count: usize },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors raised while opening a database context tree.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The database root does not exist or is not a directory.
    #[error("Database root is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Reading a configuration file failed.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed.
    #[error("Invalid configuration in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A nested database refers back to one of its ancestors.
    #[error("Nested database cycle at {path}")]
    Cycle { path: PathBuf },

    /// A setting has an unusable value.
    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

/// Errors raised when persisting a name list.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Writing or reading the backing file failed.
    #[error("Cannot access list file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file holds invalid content.
    #[error("Invalid list file {path}: {message}")]
    Format { path: PathBuf, message: String },
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A directory entry could not be read.
    ReadError,
    /// A storage root could not be scanned.
    RootUnavailable,
    /// A file looked like an artifact but its name did not parse.
    MalformedName,
}

/// Problem that did not stop a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning for a root that could not be scanned.
    pub fn root_unavailable(path: impl Into<PathBuf>, error: &ScanError) -> Self {
        Self::new(path, error.to_string(), WarningKind::RootUnavailable)
    }

    /// Create a warning for an artifact file whose name did not parse.
    pub fn malformed_name(path: impl Into<PathBuf>, error: &NameError) -> Self {
        Self::new(path, error.to_string(), WarningKind::MalformedName)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_root_unavailable_warning() {
        let err = ScanError::NotFound {
            path: PathBuf::from("/missing"),
        };
        let warning = ScanWarning::root_unavailable("/missing", &err);
        assert_eq!(warning.kind, WarningKind::RootUnavailable);
        assert!(warning.message.contains("Path not found"));
    }
}
