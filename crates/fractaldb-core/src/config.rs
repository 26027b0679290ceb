//! Scanner configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::artifact::{ArtifactKind, Category};

/// Configuration of a single direct scanner.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScannerConfig {
    /// Label used in logs, usually `<database>/<category>`.
    #[builder(default = "String::from(\"scanner\")")]
    #[serde(default)]
    pub label: String,

    /// Storage roots to walk.
    pub roots: Vec<PathBuf>,

    /// Artifact kinds to index.
    pub kinds: Vec<ArtifactKind>,

    /// Sub-trees skipped during the walk (e.g. nested databases).
    #[builder(default)]
    #[serde(default)]
    pub exclude: Vec<PathBuf>,

    /// File name patterns to ignore (glob syntax).
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Include hidden files (starting with .).
    #[builder(default = "false")]
    #[serde(default)]
    pub include_hidden: bool,

    /// Number of threads for walking (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

impl ScannerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.roots {
            Some(ref roots) if roots.is_empty() => {
                return Err("At least one root is required".to_string());
            }
            Some(ref roots) if roots.iter().any(|r| r.as_os_str().is_empty()) => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Roots are required".to_string()),
            _ => {}
        }
        match self.kinds {
            Some(ref kinds) if kinds.is_empty() => {
                Err("At least one artifact kind is required".to_string())
            }
            None => Err("Artifact kinds are required".to_string()),
            _ => Ok(()),
        }
    }
}

impl ScannerConfig {
    /// Create a new scanner config builder.
    pub fn builder() -> ScannerConfigBuilder {
        ScannerConfigBuilder::default()
    }

    /// Create a simple config scanning one root for a category.
    pub fn for_category(root: impl Into<PathBuf>, category: Category) -> Self {
        Self {
            label: category.to_string(),
            roots: vec![root.into()],
            kinds: category.kinds().to_vec(),
            exclude: Vec::new(),
            ignore_patterns: Vec::new(),
            follow_symlinks: false,
            include_hidden: false,
            threads: 0,
        }
    }

    /// Whether a file of `kind` should be indexed.
    pub fn accepts(&self, kind: ArtifactKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Whether `path` lies in an excluded sub-tree.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.iter().any(|e| path.starts_with(e))
    }

    /// Check if hidden files should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScannerConfig::builder()
            .roots(vec![PathBuf::from("/db")])
            .kinds(vec![ArtifactKind::Raster])
            .threads(4usize)
            .follow_symlinks(true)
            .build()
            .unwrap();

        assert_eq!(config.roots, vec![PathBuf::from("/db")]);
        assert_eq!(config.threads, 4);
        assert!(config.follow_symlinks);
        assert!(!config.include_hidden);
    }

    #[test]
    fn test_builder_requires_roots_and_kinds() {
        assert!(ScannerConfig::builder()
            .kinds(vec![ArtifactKind::Raster])
            .build()
            .is_err());
        assert!(ScannerConfig::builder()
            .roots(Vec::<PathBuf>::new())
            .kinds(vec![ArtifactKind::Raster])
            .build()
            .is_err());
        assert!(ScannerConfig::builder()
            .roots(vec![PathBuf::from("/db")])
            .kinds(Vec::<ArtifactKind>::new())
            .build()
            .is_err());
    }

    #[test]
    fn test_for_category() {
        let config = ScannerConfig::for_category("/db", Category::ImageData);
        assert!(config.accepts(ArtifactKind::Raster));
        assert!(!config.accepts(ArtifactKind::Info));
        assert_eq!(config.label, "image-data");
    }

    #[test]
    fn test_excluded_subtrees() {
        let mut config = ScannerConfig::for_category("/db", Category::All);
        config.exclude.push(PathBuf::from("/db/nested"));
        assert!(config.is_excluded(Path::new("/db/nested/root.mr")));
        assert!(!config.is_excluded(Path::new("/db/nested2/root.mr")));
        assert!(config.should_skip_hidden(".cache"));
    }
}
