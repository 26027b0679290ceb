//! Resolved artifact handles.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::artifact::ArtifactKind;
use crate::error::ScanError;
use crate::name::QualifiedName;

/// Binding of a qualified name to an artifact file.
///
/// Handles are snapshots taken at scan time. The payload is read from disk
/// on first access and cached afterwards; reading may fail even though the
/// name resolved.
#[derive(Debug)]
pub struct Handle {
    name: QualifiedName,
    path: PathBuf,
    kind: ArtifactKind,
    payload: OnceLock<Arc<[u8]>>,
}

impl Handle {
    /// Create a handle for an artifact file.
    pub fn new(name: QualifiedName, path: impl Into<PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            name,
            path: path.into(),
            kind,
            payload: OnceLock::new(),
        }
    }

    /// The qualified name this handle resolves.
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// Location of the artifact file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Kind of artifact.
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Whether the artifact carries image data.
    pub fn has_image_data(&self) -> bool {
        self.kind.has_image_data()
    }

    /// Whether the payload has already been loaded.
    pub fn is_loaded(&self) -> bool {
        self.payload.get().is_some()
    }

    /// Load the artifact payload, reading the file on first access.
    pub fn data(&self) -> Result<Arc<[u8]>, ScanError> {
        if let Some(data) = self.payload.get() {
            return Ok(Arc::clone(data));
        }
        let bytes = std::fs::read(&self.path).map_err(|e| ScanError::io(&self.path, e))?;
        let data: Arc<[u8]> = Arc::from(bytes);
        // Another thread may have won the race; its payload is equivalent.
        let _ = self.payload.set(Arc::clone(&data));
        Ok(self.payload.get().map(Arc::clone).unwrap_or(data))
    }
}

/// Whether any of the handles carries image data.
pub fn has_image_data<'a>(handles: impl IntoIterator<Item = &'a Arc<Handle>>) -> bool {
    handles.into_iter().any(|h| h.has_image_data())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lazy_payload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("root.mr");
        std::fs::write(&path, b"raster").unwrap();

        let handle = Handle::new(
            QualifiedName::parse("root").unwrap(),
            &path,
            ArtifactKind::Raster,
        );
        assert!(!handle.is_loaded());
        assert_eq!(&*handle.data().unwrap(), b"raster");
        assert!(handle.is_loaded());

        // Cached payload survives file removal.
        std::fs::remove_file(&path).unwrap();
        assert_eq!(&*handle.data().unwrap(), b"raster");
    }

    #[test]
    fn test_missing_payload_is_an_error() {
        let handle = Handle::new(
            QualifiedName::parse("root").unwrap(),
            "/nonexistent/root.mr",
            ArtifactKind::Raster,
        );
        assert!(matches!(handle.data(), Err(ScanError::NotFound { .. })));
    }

    #[test]
    fn test_has_image_data() {
        let info = Arc::new(Handle::new(
            QualifiedName::parse("root").unwrap(),
            "root.md",
            ArtifactKind::Info,
        ));
        let raster = Arc::new(Handle::new(
            QualifiedName::parse("root").unwrap(),
            "root.mr",
            ArtifactKind::Raster,
        ));
        assert!(!has_image_data([&info]));
        assert!(has_image_data([&info, &raster]));
    }
}
