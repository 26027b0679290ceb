//! Persistence for name lists.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use fractaldb_core::{PersistenceError, QualifiedName};

/// Durable storage for a list of names.
pub trait ListStore: Send + Sync {
    /// Read the stored names. A store that was never written is empty.
    fn load(&self) -> Result<Vec<QualifiedName>, PersistenceError>;

    /// Replace the stored names.
    fn save(&self, names: &[QualifiedName]) -> Result<(), PersistenceError>;

    /// Where the list lives, for logs.
    fn location(&self) -> String;
}

/// List stored as a JSON array of names.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ListStore for JsonFileStore {
    fn load(&self) -> Result<Vec<QualifiedName>, PersistenceError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| PersistenceError::Format {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn save(&self, names: &[QualifiedName]) -> Result<(), PersistenceError> {
        let json = serde_json::to_vec_pretty(names).map_err(|e| PersistenceError::Format {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        // Write aside and rename so readers never see a truncated file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), names = names.len(), "list saved");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store that counts saves. Useful for tests and read-only runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    names: Mutex<Vec<QualifiedName>>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `names`.
    pub fn with_names(names: impl IntoIterator<Item = QualifiedName>) -> Self {
        Self {
            names: Mutex::new(names.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn names(&self) -> Vec<QualifiedName> {
        self.names.lock().clone()
    }
}

impl ListStore for MemoryStore {
    fn load(&self) -> Result<Vec<QualifiedName>, PersistenceError> {
        Ok(self.names())
    }

    fn save(&self, names: &[QualifiedName]) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::other("store unavailable"),
            });
        }
        *self.names.lock() = names.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

impl<S: ListStore + ?Sized> ListStore for std::sync::Arc<S> {
    fn load(&self) -> Result<Vec<QualifiedName>, PersistenceError> {
        (**self).load()
    }

    fn save(&self, names: &[QualifiedName]) -> Result<(), PersistenceError> {
        (**self).save(names)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path().join("seen.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_json_store_persists() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path().join("seen.json"));
        let names = vec![
            QualifiedName::parse("a.b").unwrap(),
            QualifiedName::parse("a.c-hires").unwrap(),
        ];
        store.save(&names).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"a.c-hires\""));
        assert_eq!(JsonFileStore::new(store.path()).load().unwrap(), names);
    }

    #[test]
    fn test_invalid_json_is_format_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("seen.json");
        fs::write(&path, "[\"not..valid\"]").unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).load(),
            Err(PersistenceError::Format { .. })
        ));
    }

    #[test]
    fn test_memory_store_failure() {
        let store = MemoryStore::new();
        store.set_failing(true);
        assert!(store.save(&[]).is_err());
        assert_eq!(store.save_count(), 0);
    }
}
