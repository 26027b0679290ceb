//! Error types for file operations.

use std::path::PathBuf;

use thiserror::Error;

use fractaldb_core::NameError;

/// A relocation attempt that did not complete. The file stays where it was.
#[derive(Debug, Error)]
pub enum RelocationError {
    /// The file name does not resolve to a qualified name.
    #[error("Cannot resolve {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: NameError,
    },

    /// A path could not be canonicalized.
    #[error("Cannot canonicalize {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store already holds a file of the same name.
    #[error("Target {path} already exists")]
    TargetExists { path: PathBuf },

    /// Neither rename nor copy produced the destination file.
    #[error("Cannot move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The copy succeeded but the original could not be removed.
    #[error("Cannot remove {path} after copying: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while backing up a file.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The file to back up does not exist.
    #[error("Not a file: {path}")]
    NotAFile { path: PathBuf },

    /// The backup folder could not be created.
    #[error("Cannot create backup folder {path}: {source}")]
    Folder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Moving into the backup folder failed, also after clearing the target.
    #[error("Cannot move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
