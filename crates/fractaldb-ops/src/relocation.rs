//! Moving newly saved rasters into their seen store.

use std::io;
use std::path::{Path, PathBuf};

use strum::Display;
use tracing::{debug, info, warn};

use fractaldb_core::settings::keys;
use fractaldb_core::{QualifiedName, Settings, Storage};

use crate::error::RelocationError;

/// Why a relocation was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SkipReason {
    #[strum(to_string = "no seen store configured")]
    NoStorePath,
    #[strum(to_string = "no save roots configured")]
    NoSaveRoots,
    #[strum(to_string = "database is read-only")]
    ReadOnly,
    #[strum(to_string = "not a file")]
    NotAFile,
    #[strum(to_string = "file is outside the save roots")]
    OutsideSaveRoots,
    #[strum(to_string = "file is already in the store")]
    AlreadyInStore,
}

/// Outcome of a relocation attempt.
#[derive(Debug)]
pub enum Relocation {
    Moved { from: PathBuf, to: PathBuf },
    Skipped(SkipReason),
    Failed(RelocationError),
}

impl Relocation {
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Where seen rasters go and which locations they are taken from.
#[derive(Debug, Clone, Default)]
pub struct RelocationPolicy {
    /// Roots new rasters are saved to.
    pub save_roots: Vec<PathBuf>,
    /// Store for seen unqualified rasters.
    pub raster_store: Option<PathBuf>,
    /// Store for seen qualified rasters; falls back to `raster_store`.
    pub variant_store: Option<PathBuf>,
    pub readonly: bool,
}

impl RelocationPolicy {
    /// Read the policy from database settings.
    pub fn from_settings(settings: &Settings, readonly: bool) -> Self {
        Self {
            save_roots: settings.path_list(keys::RASTER_SAVE_PATH),
            raster_store: settings.path(keys::RASTER_SEEN_PATH),
            variant_store: settings.path(keys::VARIANT_SEEN_PATH),
            readonly,
        }
    }

    /// Store path for a name.
    pub fn store_for(&self, name: &QualifiedName) -> Option<&Path> {
        if name.is_qualified() {
            if let Some(store) = &self.variant_store {
                return Some(store);
            }
        }
        self.raster_store.as_deref()
    }

    /// Move `path` into the store for `name` when the policy asks for it.
    pub fn relocate(&self, storage: &dyn Storage, path: &Path, name: &QualifiedName) -> Relocation {
        match self.try_relocate(storage, path, name) {
            Ok(relocation) => relocation,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "relocation failed, file left in place");
                Relocation::Failed(e)
            }
        }
    }

    fn try_relocate(
        &self,
        storage: &dyn Storage,
        path: &Path,
        name: &QualifiedName,
    ) -> Result<Relocation, RelocationError> {
        let Some(store) = self.store_for(name) else {
            return Ok(skip(path, SkipReason::NoStorePath));
        };
        if self.save_roots.is_empty() {
            return Ok(skip(path, SkipReason::NoSaveRoots));
        }
        if self.readonly {
            return Ok(skip(path, SkipReason::ReadOnly));
        }
        if !storage.is_file(path) {
            return Ok(skip(path, SkipReason::NotAFile));
        }

        let parent = storage
            .parent(path)
            .ok_or_else(|| RelocationError::Canonicalize {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "no parent directory"),
            })?;
        let parent = canonical(storage, &parent)?;

        let in_save_root = self
            .save_roots
            .iter()
            .filter_map(|root| storage.canonicalize(root).ok())
            .any(|root| root == parent);
        if !in_save_root {
            return Ok(skip(path, SkipReason::OutsideSaveRoots));
        }

        if !storage.is_dir(store) {
            storage
                .create_dir_all(store)
                .map_err(|source| RelocationError::Canonicalize {
                    path: store.to_path_buf(),
                    source,
                })?;
        }
        let store = canonical(storage, store)?;
        if store == parent {
            return Ok(skip(path, SkipReason::AlreadyInStore));
        }

        let Some(file_name) = path.file_name() else {
            return Ok(skip(path, SkipReason::NotAFile));
        };
        let target = store.join(file_name);
        if storage.exists(&target) {
            return Err(RelocationError::TargetExists { path: target });
        }
        move_file(storage, path, &target)?;

        info!(from = %path.display(), to = %target.display(), "relocated seen raster");
        Ok(Relocation::Moved {
            from: path.to_path_buf(),
            to: target,
        })
    }
}

fn skip(path: &Path, reason: SkipReason) -> Relocation {
    debug!(path = %path.display(), %reason, "relocation skipped");
    Relocation::Skipped(reason)
}

fn canonical(storage: &dyn Storage, path: &Path) -> Result<PathBuf, RelocationError> {
    storage
        .canonicalize(path)
        .map_err(|source| RelocationError::Canonicalize {
            path: path.to_path_buf(),
            source,
        })
}

/// Rename, falling back to copy. The original is removed only once both
/// files are known to exist; a failed copy removes its partial target.
fn move_file(storage: &dyn Storage, from: &Path, to: &Path) -> Result<(), RelocationError> {
    if storage.rename(from, to).is_ok() {
        return Ok(());
    }

    if let Err(source) = storage.copy(from, to) {
        if storage.exists(to) {
            if let Err(e) = storage.delete(to) {
                debug!(path = %to.display(), error = %e, "cannot remove partial copy");
            }
        }
        return Err(RelocationError::Move {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        });
    }
    if storage.exists(from) && storage.exists(to) {
        storage
            .delete(from)
            .map_err(|source| RelocationError::Delete {
                path: from.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str) -> QualifiedName {
        QualifiedName::parse(text).unwrap()
    }

    #[test]
    fn test_store_for_variants() {
        let policy = RelocationPolicy {
            raster_store: Some(PathBuf::from("/seen")),
            variant_store: Some(PathBuf::from("/variants")),
            ..Default::default()
        };
        assert_eq!(policy.store_for(&q("a.b")), Some(Path::new("/seen")));
        assert_eq!(policy.store_for(&q("a.b-hires")), Some(Path::new("/variants")));

        let policy = RelocationPolicy {
            raster_store: Some(PathBuf::from("/seen")),
            ..Default::default()
        };
        assert_eq!(policy.store_for(&q("a.b-hires")), Some(Path::new("/seen")));
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::new("/db", Default::default());
        settings.set(keys::RASTER_SAVE_PATH, "new:/tmp/other");
        settings.set(keys::RASTER_SEEN_PATH, "seen");

        let policy = RelocationPolicy::from_settings(&settings, true);
        assert_eq!(
            policy.save_roots,
            vec![PathBuf::from("/db/new"), PathBuf::from("/tmp/other")]
        );
        assert_eq!(policy.raster_store, Some(PathBuf::from("/db/seen")));
        assert!(policy.variant_store.is_none());
        assert!(policy.readonly);
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::ReadOnly.to_string(), "database is read-only");
    }
}
