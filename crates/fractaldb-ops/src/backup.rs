//! Backup folders and backup moves.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use fractaldb_core::settings::keys;
use fractaldb_core::{Category, Settings, Storage};

use crate::error::BackupError;

/// Settings key of the backup folder for a category.
pub fn backup_key(category: Category) -> &'static str {
    match category {
        Category::Info | Category::PrioInfo => keys::INFO_BACKUP_PATH,
        Category::Raster | Category::NewRaster => keys::RASTER_BACKUP_PATH,
        Category::RasterImage => keys::RASTERIMAGE_BACKUP_PATH,
        _ => keys::BACKUP_PATH,
    }
}

/// Backup folder for a category, created on demand.
///
/// Falls back to the generic backup folder. `Ok(None)` when neither is set.
pub fn backup_folder(
    storage: &dyn Storage,
    settings: &Settings,
    category: Category,
) -> Result<Option<PathBuf>, BackupError> {
    let Some(folder) = settings.backup_path(backup_key(category)) else {
        return Ok(None);
    };
    if !storage.is_dir(&folder) {
        storage
            .create_dir_all(&folder)
            .map_err(|source| BackupError::Folder {
                path: folder.clone(),
                source,
            })?;
    }
    debug!(folder = %folder.display(), %category, "using backup folder");
    Ok(Some(folder))
}

/// Move `path` into `folder`, replacing an older backup of the same name.
///
/// Returns the backup location.
pub fn backup_file(storage: &dyn Storage, path: &Path, folder: &Path) -> Result<PathBuf, BackupError> {
    if !storage.is_file(path) {
        return Err(BackupError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    let Some(file_name) = path.file_name() else {
        return Err(BackupError::NotAFile {
            path: path.to_path_buf(),
        });
    };
    let target = folder.join(file_name);

    if storage.rename(path, &target).is_err() {
        // Some platforms refuse to rename over an existing file.
        if storage.exists(&target) {
            if let Err(e) = storage.delete(&target) {
                debug!(target = %target.display(), error = %e, "cannot clear old backup");
            }
        }
        storage
            .rename(path, &target)
            .map_err(|source| BackupError::Move {
                from: path.to_path_buf(),
                to: target.clone(),
                source,
            })?;
    }

    info!(from = %path.display(), to = %target.display(), "backed up");
    Ok(target)
}
