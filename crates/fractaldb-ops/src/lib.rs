//! File operations for fractaldb.
//!
//! This crate holds the operations that change storage: relocating rasters
//! once they have been seen and moving replaced artifacts into backup
//! folders. All file access goes through [`fractaldb_core::Storage`].

mod backup;
mod error;
mod relocation;
mod tracker;

pub use backup::{backup_file, backup_folder, backup_key};
pub use error::{BackupError, RelocationError};
pub use relocation::{Relocation, RelocationPolicy, SkipReason};
pub use tracker::{SeenListener, SeenReport, SeenTracker};
