//! Core types and traits for fractaldb.
//!
//! This crate provides the fundamental data structures used throughout
//! the fractaldb workspace: hierarchical area names, artifact kinds and
//! categories, handles, configuration, settings and the storage abstraction.

mod artifact;
mod config;
mod error;
mod handle;
mod name;
pub mod settings;
mod storage;

pub use artifact::{ArtifactKind, Category, CategoryRoots};
pub use config::{ScannerConfig, ScannerConfigBuilder};
pub use error::{ConfigError, NameError, PersistenceError, ScanError, ScanWarning, WarningKind};
pub use handle::{Handle, has_image_data};
pub use name::{AreaName, QUALIFIER_SEPARATOR, QualifiedName, SEGMENT_SEPARATOR};
pub use settings::{CONFIG_FILE_NAME, DatabaseConfig, Settings};
pub use storage::{LocalStorage, Storage};
