//! Seen bookkeeping and the list of image data not yet looked at.

use std::sync::Arc;

use tracing::{debug, warn};

use fractaldb_core::{PersistenceError, QualifiedName, ScanError};
use fractaldb_scan::Scanner;

use crate::store::ListStore;
use crate::unique::{self, UniqueList};

/// Persisted set of names that have been seen.
pub struct SeenList {
    names: UniqueList,
    store: Box<dyn ListStore>,
}

impl SeenList {
    /// Load the list from its store.
    pub fn open(store: Box<dyn ListStore>) -> Result<Self, PersistenceError> {
        let names = store.load()?.into_iter().collect();
        Ok(Self { names, store })
    }

    /// Start empty, ignoring whatever the store holds.
    pub fn empty(store: Box<dyn ListStore>) -> Self {
        Self {
            names: UniqueList::new(),
            store,
        }
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.names.contains(name)
    }

    /// Mark a name seen in memory. Call [`SeenList::save`] to persist.
    pub fn insert(&mut self, name: QualifiedName) -> bool {
        self.names.insert(name)
    }

    pub fn save(&self) -> Result<(), PersistenceError> {
        self.store.save(&self.names.to_vec())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> unique::Iter<'_> {
        self.names.iter()
    }

    pub fn location(&self) -> String {
        self.store.location()
    }
}

/// Image-data names that are not in the seen list.
pub struct UnseenList {
    source: Arc<dyn Scanner>,
    seen: SeenList,
    entries: UniqueList,
}

impl UnseenList {
    /// Build the list with an initial soft refresh.
    pub fn new(source: Arc<dyn Scanner>, seen: SeenList) -> Self {
        let mut list = Self {
            source,
            seen,
            entries: UniqueList::new(),
        };
        list.recompute();
        list
    }

    /// Recompute, rescanning the source first unless `soft`.
    pub fn refresh(&mut self, soft: bool) -> Result<(), ScanError> {
        let rescan = if soft {
            Ok(())
        } else {
            self.source.rescan(false).map(|_| ())
        };
        if let Err(e) = &rescan {
            warn!(error = %e, "unseen source rescan failed, using previous index");
        }
        self.recompute();
        rescan
    }

    fn recompute(&mut self) {
        self.entries.clear();
        for area in self.source.names() {
            let unseen = self
                .source
                .qualified_names(&area)
                .into_iter()
                .filter(|n| !self.seen.contains(n));
            self.entries.extend(unseen);
        }
        debug!(entries = self.entries.len(), "unseen list recomputed");
    }

    /// Mark `name` seen: drop it from the list and persist the seen list.
    ///
    /// Returns whether the name was unseen. When saving fails the in-memory
    /// change stays and the next successful save catches up.
    pub fn remove(&mut self, name: &QualifiedName) -> Result<bool, PersistenceError> {
        if !self.entries.remove(name) {
            return Ok(false);
        }
        self.seen.insert(name.clone());
        if let Err(e) = self.seen.save() {
            warn!(%name, location = %self.seen.location(), error = %e, "cannot persist seen list");
            return Err(e);
        }
        debug!(%name, "marked seen");
        Ok(true)
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.entries.contains(name)
    }

    pub fn entries(&self) -> &UniqueList {
        &self.entries
    }

    pub fn seen(&self) -> &SeenList {
        &self.seen
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> unique::Iter<'_> {
        self.entries.iter()
    }
}
