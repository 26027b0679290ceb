//! Errors surfaced by the environment facade.

use thiserror::Error;

use fractaldb_core::{ConfigError, NameError, PersistenceError};
use fractaldb_ops::BackupError;

/// Errors raised while opening or driving an [`crate::Environment`].
#[derive(Debug, Error)]
pub enum EnvError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot load seen list: {0}")]
    SeenList(#[from] PersistenceError),

    #[error(transparent)]
    Name(#[from] NameError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    /// No context carries the requested label.
    #[error("Unknown database '{label}'")]
    UnknownDatabase { label: String },

    /// The database does not support the category.
    #[error("Category '{category}' is not available")]
    MissingCategory { category: String },
}
