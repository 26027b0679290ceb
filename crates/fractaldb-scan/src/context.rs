//! Databases and the (possibly federated) context tree that owns them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use itertools::Itertools;
use strum::IntoEnumIterator;
use tracing::{debug, warn};

use fractaldb_core::{
    Category, CategoryRoots, ConfigError, DatabaseConfig, ScannerConfig, Settings,
    CONFIG_FILE_NAME,
};

use crate::direct::DirectScanner;
use crate::scanner::Scanner;

/// Settings key holding comma separated ignore globs for all scanners.
pub const SCAN_IGNORE_KEY: &str = "scan.ignore";

/// One storage root with its settings and per-category direct scanners.
pub struct Database {
    label: String,
    root: PathBuf,
    readonly: bool,
    settings: Settings,
    scanners: BTreeMap<Category, Arc<DirectScanner>>,
}

impl Database {
    /// Build a database over `root`. `exclude` lists nested member roots
    /// that must not be indexed as part of this database.
    pub fn new(
        root: PathBuf,
        config: DatabaseConfig,
        exclude: Vec<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let label = config.label.clone().unwrap_or_else(|| default_label(&root));
        let settings = Settings::new(&root, config.properties);
        let ignore_patterns: Vec<String> = settings
            .get(SCAN_IGNORE_KEY)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let mut scanners = BTreeMap::new();
        for category in Category::iter() {
            let roots = match category.roots() {
                CategoryRoots::Database => vec![root.clone()],
                CategoryRoots::Property(key) => settings.path_list(key),
            };
            if roots.is_empty() {
                debug!(database = %label, %category, "category not configured");
                continue;
            }

            let config = ScannerConfig::builder()
                .label(format!("{label}/{category}"))
                .roots(roots)
                .kinds(category.kinds().to_vec())
                .exclude(exclude.clone())
                .ignore_patterns(ignore_patterns.clone())
                .build()
                .map_err(|e| ConfigError::InvalidValue {
                    key: category.to_string(),
                    value: e.to_string(),
                })?;
            let scanner = DirectScanner::new(config).map_err(|e| ConfigError::InvalidValue {
                key: SCAN_IGNORE_KEY.to_string(),
                value: e.to_string(),
            })?;
            scanners.insert(category, Arc::new(scanner));
        }

        Ok(Self {
            label,
            root,
            readonly: config.readonly,
            settings,
            scanners,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Property lookup; empty values count as unset.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.settings.get(key)
    }

    /// Direct scanner for a category, if the database supports it.
    pub fn scanner(&self, category: Category) -> Option<Arc<dyn Scanner>> {
        self.scanners
            .get(&category)
            .map(|s| Arc::clone(s) as Arc<dyn Scanner>)
    }

    /// Categories this database supports.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.scanners.keys().copied()
    }
}

fn default_label(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root.display().to_string())
}

/// A database plus its nested federation members.
pub struct Context {
    database: Database,
    nested: Vec<Context>,
}

impl Context {
    /// Open the context tree rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut ancestors = Vec::new();
        Self::open_inner(root.as_ref(), &mut ancestors)
    }

    fn open_inner(root: &Path, ancestors: &mut Vec<PathBuf>) -> Result<Self, ConfigError> {
        let root = root
            .canonicalize()
            .map_err(|_| ConfigError::NotADirectory {
                path: root.to_path_buf(),
            })?;
        if !root.is_dir() {
            return Err(ConfigError::NotADirectory { path: root });
        }
        if ancestors.contains(&root) {
            return Err(ConfigError::Cycle { path: root });
        }

        let config = read_config(&root)?;
        let nested_roots: Vec<PathBuf> = config.nested.iter().map(|p| root.join(p)).collect();

        ancestors.push(root.clone());
        let mut nested = Vec::with_capacity(nested_roots.len());
        for nested_root in &nested_roots {
            nested.push(Self::open_inner(nested_root, ancestors)?);
        }
        ancestors.pop();

        let exclude = nested
            .iter()
            .map(|c| c.database.root.clone())
            .filter(|p| p.starts_with(&root))
            .collect();
        let database = Database::new(root, config, exclude)?;

        Ok(Self { database, nested })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn label(&self) -> &str {
        self.database.label()
    }

    /// Whether this context federates nested members.
    pub fn has_nested(&self) -> bool {
        !self.nested.is_empty()
    }

    pub fn nested(&self) -> &[Context] {
        &self.nested
    }

    /// All federation members in declaration order: this context first,
    /// then nested members depth-first.
    pub fn members(&self) -> Vec<&Context> {
        let mut members = vec![self];
        for child in &self.nested {
            members.extend(child.members());
        }
        members
    }

    /// Find a member by label.
    pub fn context(&self, label: &str) -> Option<&Context> {
        self.members().into_iter().find(|c| c.label() == label)
    }

    /// Human-readable layout of the tree, one line per member.
    pub fn layout(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.layout_into(0, &mut lines);
        lines
    }

    fn layout_into(&self, depth: usize, lines: &mut Vec<String>) {
        let db = &self.database;
        lines.push(format!(
            "{}{} ({}){} [{}]",
            "  ".repeat(depth),
            db.label(),
            db.root().display(),
            if db.is_readonly() { " readonly" } else { "" },
            db.categories().join(", ")
        ));
        for child in &self.nested {
            child.layout_into(depth + 1, lines);
        }
    }
}

fn read_config(root: &Path) -> Result<DatabaseConfig, ConfigError> {
    let path = root.join(CONFIG_FILE_NAME);
    if !path.is_file() {
        warn!(root = %root.display(), "no {CONFIG_FILE_NAME}, using defaults");
        return Ok(DatabaseConfig::default());
    }
    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::Parse {
        path,
        message: e.to_string(),
    })
}
