//! Database settings and property lookup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the configuration file at the root of every database.
pub const CONFIG_FILE_NAME: &str = "fractaldb.toml";

/// Property keys understood by the engine.
pub mod keys {
    /// Staging folders new rasters are saved to (`:` or `;` separated).
    pub const RASTER_SAVE_PATH: &str = "raster.save.path";
    /// Canonical store for seen rasters.
    pub const RASTER_SEEN_PATH: &str = "raster.seen.path";
    /// Canonical store for seen qualified variants.
    pub const VARIANT_SEEN_PATH: &str = "variant.seen.path";
    /// Folder holding priority info files.
    pub const PRIO_INFO_PATH: &str = "info.prio.path";
    /// Default backup folder.
    pub const BACKUP_PATH: &str = "backup.path";
    pub const INFO_BACKUP_PATH: &str = "info.backup.path";
    pub const RASTER_BACKUP_PATH: &str = "raster.backup.path";
    pub const RASTERIMAGE_BACKUP_PATH: &str = "rasterimage.backup.path";
    /// Whether automatic rescans are enabled at startup.
    pub const AUTORESCAN: &str = "autorescan";
    /// Name of the default colormap.
    pub const DEFAULT_COLORMAP: &str = "colormap.default";
    /// Site label.
    pub const SITE: &str = "site";
    /// Site owner label.
    pub const USER: &str = "user";
    /// File holding the persisted seen list.
    pub const SEEN_LIST: &str = "seen.list";
}

/// Default file name of the persisted seen list.
pub const DEFAULT_SEEN_LIST: &str = "seen.json";

/// Contents of a database's `fractaldb.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Label identifying the database inside a federation.
    pub label: Option<String>,
    /// Whether the database must not be modified.
    pub readonly: bool,
    /// Nested member databases, relative to the database root.
    pub nested: Vec<PathBuf>,
    /// Free-form properties.
    pub properties: BTreeMap<String, String>,
}

/// String property lookup for one database.
///
/// Relative paths in properties resolve against the database root.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    base: PathBuf,
    properties: BTreeMap<String, String>,
}

impl Settings {
    /// Create settings for a database rooted at `base`.
    pub fn new(base: impl Into<PathBuf>, properties: BTreeMap<String, String>) -> Self {
        Self {
            base: base.into(),
            properties,
        }
    }

    /// The directory relative paths resolve against.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Raw property value; empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Set or replace a property.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Boolean switch with a default for unset or unrecognized values.
    pub fn switch(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(|v| v.to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "true" | "yes" | "on" | "1") => true,
            Some(v) if matches!(v.as_str(), "false" | "no" | "off" | "0") => false,
            _ => default,
        }
    }

    /// A single path property.
    pub fn path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(|v| self.resolve(v))
    }

    /// A path list property separated by `:` or `;`.
    pub fn path_list(&self, key: &str) -> Vec<PathBuf> {
        self.get(key)
            .map(|v| {
                v.split([':', ';'])
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(|p| self.resolve(p))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A category backup folder, falling back to the default backup folder.
    pub fn backup_path(&self, key: &str) -> Option<PathBuf> {
        self.path(key).or_else(|| self.path(keys::BACKUP_PATH))
    }

    /// Location of the persisted seen list.
    pub fn seen_list_path(&self) -> PathBuf {
        self.path(keys::SEEN_LIST)
            .unwrap_or_else(|| self.base.join(DEFAULT_SEEN_LIST))
    }

    /// Iterate over all properties.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn resolve(&self, value: &str) -> PathBuf {
        let path = Path::new(value);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        Settings::new(
            "/db",
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_empty_values_are_unset() {
        let s = settings(&[(keys::SITE, "  ")]);
        assert_eq!(s.get(keys::SITE), None);
    }

    #[test]
    fn test_path_list_splits_on_both_separators() {
        let s = settings(&[(keys::RASTER_SAVE_PATH, "/a:/b;incoming")]);
        assert_eq!(
            s.path_list(keys::RASTER_SAVE_PATH),
            vec![
                PathBuf::from("/a"),
                PathBuf::from("/b"),
                PathBuf::from("/db/incoming")
            ]
        );
    }

    #[test]
    fn test_switch() {
        let s = settings(&[(keys::AUTORESCAN, "off")]);
        assert!(!s.switch(keys::AUTORESCAN, true));
        assert!(s.switch("missing", true));
    }

    #[test]
    fn test_backup_fallback() {
        let s = settings(&[(keys::BACKUP_PATH, "/backup")]);
        assert_eq!(
            s.backup_path(keys::RASTER_BACKUP_PATH),
            Some(PathBuf::from("/backup"))
        );

        let s = settings(&[
            (keys::BACKUP_PATH, "/backup"),
            (keys::RASTER_BACKUP_PATH, "/raster-backup"),
        ]);
        assert_eq!(
            s.backup_path(keys::RASTER_BACKUP_PATH),
            Some(PathBuf::from("/raster-backup"))
        );
    }

    #[test]
    fn test_seen_list_default() {
        let s = settings(&[]);
        assert_eq!(s.seen_list_path(), PathBuf::from("/db/seen.json"));
    }
}
