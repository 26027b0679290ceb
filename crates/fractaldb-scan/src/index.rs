//! Immutable scan index snapshots.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use fractaldb_core::{AreaName, Handle, QualifiedName, ScanWarning};

/// Snapshot of everything one scan found.
///
/// A scanner swaps whole snapshots; an index is never mutated once it has
/// been published.
#[derive(Debug, Default)]
pub struct ScanIndex {
    names: BTreeMap<AreaName, BTreeSet<QualifiedName>>,
    handles: HashMap<QualifiedName, Vec<Arc<Handle>>>,
    children: BTreeMap<AreaName, BTreeSet<AreaName>>,
    artifact_count: usize,
    scanned_at: Option<DateTime<Utc>>,
    warnings: Vec<ScanWarning>,
}

impl ScanIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle. Later handles for the same name are secondary.
    pub(crate) fn insert(&mut self, handle: Arc<Handle>) {
        let qualified = handle.name().clone();
        let area = qualified.area_name().clone();

        if let Some(parent) = area.parent() {
            self.children.entry(parent).or_default().insert(area.clone());
        }
        self.names.entry(area).or_default().insert(qualified.clone());
        self.handles
            .entry(qualified)
            .or_default()
            .push(handle);
        self.artifact_count += 1;
    }

    pub(crate) fn push_warning(&mut self, warning: ScanWarning) {
        self.warnings.push(warning);
    }

    pub(crate) fn finish(&mut self, scanned_at: DateTime<Utc>) {
        for handles in self.handles.values_mut() {
            handles.sort_by(|a, b| a.path().cmp(b.path()));
        }
        self.scanned_at = Some(scanned_at);
    }

    /// All logical names with at least one artifact.
    pub fn names(&self) -> impl Iterator<Item = &AreaName> {
        self.names.keys()
    }

    /// Qualified names registered under a logical name.
    pub fn qualified_names(&self, name: &AreaName) -> Option<&BTreeSet<QualifiedName>> {
        self.names.get(name)
    }

    /// Primary handle for a qualified name.
    pub fn handle(&self, name: &QualifiedName) -> Option<&Arc<Handle>> {
        self.handles.get(name).and_then(|h| h.first())
    }

    /// Every handle registered for a qualified name.
    pub fn all_handles(&self, name: &QualifiedName) -> &[Arc<Handle>] {
        self.handles.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Handles of all variants of a logical name.
    pub fn handles(&self, name: &AreaName) -> Vec<Arc<Handle>> {
        self.names
            .get(name)
            .into_iter()
            .flatten()
            .flat_map(|q| self.all_handles(q).iter().cloned())
            .collect()
    }

    /// Immediate sub-names that have at least one artifact.
    pub fn children(&self, name: &AreaName) -> Option<&BTreeSet<AreaName>> {
        self.children.get(name)
    }

    /// Number of logical names.
    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    /// Number of indexed artifact files.
    pub fn artifact_count(&self) -> usize {
        self.artifact_count
    }

    /// When this snapshot was completed, if it ever was.
    pub fn scanned_at(&self) -> Option<DateTime<Utc>> {
        self.scanned_at
    }

    /// Warnings collected during the scan.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractaldb_core::ArtifactKind;

    fn handle(name: &str, path: &str, kind: ArtifactKind) -> Arc<Handle> {
        Arc::new(Handle::new(QualifiedName::parse(name).unwrap(), path, kind))
    }

    #[test]
    fn test_insert_builds_children() {
        let mut index = ScanIndex::new();
        index.insert(handle("root", "/db/root.mr", ArtifactKind::Raster));
        index.insert(handle("root.a", "/db/root.a.mr", ArtifactKind::Raster));
        index.insert(handle("root.a-hires", "/db/root.a-hires.mr", ArtifactKind::Raster));
        index.insert(handle("root.b.c", "/db/root.b.c.md", ArtifactKind::Info));
        index.finish(Utc::now());

        let root = AreaName::parse("root").unwrap();
        let children: Vec<String> = index
            .children(&root)
            .unwrap()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(children, vec!["root.a"]);
        assert_eq!(index.name_count(), 3);
        assert_eq!(index.artifact_count(), 4);
        assert_eq!(index.handles(&AreaName::parse("root.a").unwrap()).len(), 2);
        assert!(index.scanned_at().is_some());
    }

    #[test]
    fn test_primary_handle_is_first_by_path() {
        let mut index = ScanIndex::new();
        index.insert(handle("root", "/db/z/root.mr", ArtifactKind::Raster));
        index.insert(handle("root", "/db/a/root.mri", ArtifactKind::RasterImage));
        index.finish(Utc::now());

        let name = QualifiedName::parse("root").unwrap();
        assert_eq!(index.handle(&name).unwrap().kind(), ArtifactKind::RasterImage);
        assert_eq!(index.all_handles(&name).len(), 2);
    }
}
