//! JWalk-based scanner over one or more storage roots.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use globset::{Glob, GlobSet, GlobSetBuilder};
use jwalk::{Parallelism, WalkDir};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use fractaldb_core::{
    AreaName, ArtifactKind, Handle, QualifiedName, ScanError, ScanWarning, ScannerConfig,
    WarningKind,
};

use crate::index::ScanIndex;
use crate::progress::ScanProgress;
use crate::scanner::{NameFilter, ScanSummary, Scanner, SubNameQuery, any_child, filter_children};

/// Artifacts between two progress updates.
const PROGRESS_INTERVAL: u64 = 500;

/// Scanner backed directly by storage roots.
///
/// The index is replaced wholesale after a successful walk, so concurrent
/// readers observe either the previous or the new snapshot. A root that
/// cannot be read contributes the entries of its last successful walk.
pub struct DirectScanner {
    config: ScannerConfig,
    ignore: GlobSet,
    index: RwLock<Arc<ScanIndex>>,
    /// Last good entries of each root, in `config.roots` order.
    root_entries: Mutex<Vec<Option<Vec<Arc<Handle>>>>>,
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl DirectScanner {
    /// Create a scanner. No scan happens until [`Scanner::rescan`].
    pub fn new(config: ScannerConfig) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.ignore_patterns {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("ignore pattern '{pattern}': {e}"),
            })?;
            builder.add(glob);
        }
        let ignore = builder.build().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;
        let (progress_tx, _) = broadcast::channel(100);
        let root_entries = Mutex::new(vec![None; config.roots.len()]);

        Ok(Self {
            config,
            ignore,
            index: RwLock::new(Arc::new(ScanIndex::new())),
            root_entries,
            progress_tx,
        })
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// The configuration this scanner was built with.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// The current index snapshot.
    pub fn snapshot(&self) -> Arc<ScanIndex> {
        self.index.read().clone()
    }

    /// Walk one root, collecting its handles into `found` and its warnings
    /// into `index`.
    fn walk_root(
        &self,
        root: &Path,
        excluded: &[PathBuf],
        found: &mut Vec<Arc<Handle>>,
        index: &mut ScanIndex,
        progress: &mut ScanProgress,
        start: Instant,
    ) -> Result<(), ScanError> {
        let root_path = root.canonicalize().map_err(|e| ScanError::io(root, e))?;
        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let parallelism = match self.config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(&root_path)
            .parallelism(parallelism)
            .skip_hidden(!self.config.include_hidden)
            .follow_links(self.config.follow_symlinks)
            .sort(true);

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    index.push_warning(ScanWarning::new(
                        path,
                        err.to_string(),
                        WarningKind::ReadError,
                    ));
                    progress.warnings_count += 1;
                    continue;
                }
            };

            let path = entry.path();
            if excluded.iter().any(|e| path.starts_with(e)) {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                progress.dirs_scanned += 1;
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            if self.config.should_skip_hidden(&file_name) || self.ignore.is_match(&*file_name) {
                continue;
            }
            let Some((_, kind)) = ArtifactKind::split_file_name(&file_name) else {
                continue;
            };
            if !self.config.accepts(kind) {
                continue;
            }

            match QualifiedName::from_path(&path) {
                Ok(name) => {
                    found.push(Arc::new(Handle::new(name, &path, kind)));
                    progress.artifacts_found += 1;
                }
                Err(err) => {
                    index.push_warning(ScanWarning::malformed_name(&path, &err));
                    progress.warnings_count += 1;
                    continue;
                }
            }

            if progress.artifacts_found % PROGRESS_INTERVAL == 0 {
                progress.current_path = path;
                progress.elapsed = start.elapsed();
                let _ = self.progress_tx.send(progress.clone());
            }
        }

        Ok(())
    }
}

impl Scanner for DirectScanner {
    fn label(&self) -> &str {
        &self.config.label
    }

    fn rescan(&self, verbose: bool) -> Result<ScanSummary, ScanError> {
        let start = Instant::now();
        let excluded: Vec<PathBuf> = self
            .config
            .exclude
            .iter()
            .filter_map(|p| p.canonicalize().ok())
            .collect();

        // Held for the whole rescan so concurrent rescans do not interleave.
        let mut retained = self.root_entries.lock();
        let mut walked = Vec::with_capacity(self.config.roots.len());
        let mut index = ScanIndex::new();
        let mut progress = ScanProgress::new(&self.config.label);
        let mut failures = Vec::new();

        for root in &self.config.roots {
            let mut found = Vec::new();
            match self.walk_root(root, &excluded, &mut found, &mut index, &mut progress, start) {
                Ok(()) => walked.push(Some(found)),
                Err(err) => {
                    warn!(scanner = %self.config.label, root = %root.display(), "cannot scan root: {err}");
                    index.push_warning(ScanWarning::root_unavailable(root, &err));
                    failures.push(err);
                    walked.push(None);
                }
            }
        }

        if failures.len() == self.config.roots.len() {
            // Keep the previous index in place.
            return Err(if failures.len() == 1 {
                failures.remove(0)
            } else {
                ScanError::NoReadableRoot {
                    count: failures.len(),
                }
            });
        }

        for (slot, fresh) in retained.iter_mut().zip(walked) {
            if let Some(fresh) = fresh {
                *slot = Some(fresh);
            } else if let Some(previous) = slot.as_ref() {
                debug!(scanner = %self.config.label, kept = previous.len(), "keeping entries of unreadable root");
            }
        }
        for handle in retained.iter().flatten().flatten() {
            index.insert(Arc::clone(handle));
        }
        drop(retained);

        index.finish(Utc::now());
        let summary = ScanSummary {
            label: self.config.label.clone(),
            names: index.name_count(),
            artifacts: index.artifact_count(),
            warnings: index.warnings().len(),
            skipped: false,
            failed_members: Vec::new(),
            elapsed: start.elapsed(),
        };

        *self.index.write() = Arc::new(index);

        progress.elapsed = summary.elapsed;
        progress.finished = true;
        let _ = self.progress_tx.send(progress);

        if verbose {
            info!(
                scanner = %summary.label,
                names = summary.names,
                artifacts = summary.artifacts,
                warnings = summary.warnings,
                "rescan complete in {:.2}s",
                summary.elapsed.as_secs_f64()
            );
        } else {
            debug!(scanner = %summary.label, names = summary.names, "rescan complete");
        }

        Ok(summary)
    }

    fn names(&self) -> BTreeSet<AreaName> {
        self.snapshot().names().cloned().collect()
    }

    fn qualified_names(&self, name: &AreaName) -> BTreeSet<QualifiedName> {
        self.snapshot()
            .qualified_names(name)
            .cloned()
            .unwrap_or_default()
    }

    fn handle(&self, name: &QualifiedName) -> Option<Arc<Handle>> {
        self.snapshot().handle(name).cloned()
    }

    fn handles(&self, name: &AreaName) -> Vec<Arc<Handle>> {
        self.snapshot().handles(name)
    }

    fn sub_name_query(&self) -> Option<&dyn SubNameQuery> {
        Some(self)
    }
}

impl SubNameQuery for DirectScanner {
    fn sub_names(&self, name: &AreaName, filter: NameFilter<'_>) -> BTreeSet<AreaName> {
        let index = self.snapshot();
        filter_children(index.children(name).into_iter().flatten(), filter)
    }

    fn has_sub_names(&self, name: &AreaName, filter: NameFilter<'_>) -> bool {
        let index = self.snapshot();
        any_child(index.children(name).into_iter().flatten(), filter)
    }
}
