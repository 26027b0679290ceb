//! Lists derived from a scanner index by a per-area predicate.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use fractaldb_core::{AreaName, QualifiedName, ScanError, has_image_data};
use fractaldb_scan::{Scanner, has_sub_names_of, sub_names_of};

use crate::unique::{self, UniqueList};

/// Which derived view a list computes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// Mirror of the new-raster scanner.
    NewRasters,
    /// Every qualified rendering.
    Variants,
    /// Areas without sub-areas.
    Leafs,
    /// Areas with a sub-area that has no image data yet.
    Pending,
    /// Leaf areas below a base area.
    DeadEnds(AreaName),
}

impl ListKind {
    /// Display title of the list.
    pub fn title(&self) -> String {
        match self {
            Self::NewRasters => "New Rasters".to_string(),
            Self::Variants => "Variants".to_string(),
            Self::Leafs => "Leafs".to_string(),
            Self::Pending => "Pending".to_string(),
            Self::DeadEnds(base) => format!("Dead Ends ({base})"),
        }
    }

    /// Names of `area` this kind accepts.
    fn accept(
        &self,
        area: &AreaName,
        names: BTreeSet<QualifiedName>,
        source: &dyn Scanner,
        all: &dyn Scanner,
    ) -> Vec<QualifiedName> {
        match self {
            Self::NewRasters => names.into_iter().collect(),
            Self::Variants => names.into_iter().filter(|n| n.is_qualified()).collect(),
            Self::Leafs => {
                if has_sub_names_of(all, area, None) {
                    Vec::new()
                } else {
                    names.into_iter().collect()
                }
            }
            Self::Pending => {
                let pending = sub_names_of(all, area, None)
                    .iter()
                    .any(|sub| !has_image_data(&all.handles(sub)));
                // Unqualified names sort first, then qualifiers lexically.
                pending
                    .then(|| names.into_iter().next())
                    .flatten()
                    .into_iter()
                    .collect()
            }
            Self::DeadEnds(base) => {
                if area.is_sub_name_of(base) && !has_sub_names_of(source, area, None) {
                    names.into_iter().collect()
                } else {
                    Vec::new()
                }
            }
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewRasters => f.write_str("new-rasters"),
            Self::Variants => f.write_str("variants"),
            Self::Leafs => f.write_str("leafs"),
            Self::Pending => f.write_str("pending"),
            Self::DeadEnds(base) => write!(f, "dead-ends:{base}"),
        }
    }
}

/// A list recomputed from a source scanner.
///
/// `all` is the scanner consulted for hierarchy questions (leafs, pending).
pub struct DerivedList {
    kind: ListKind,
    source: Arc<dyn Scanner>,
    all: Arc<dyn Scanner>,
    entries: UniqueList,
}

impl DerivedList {
    /// Build the list with an initial soft refresh.
    pub fn new(kind: ListKind, source: Arc<dyn Scanner>, all: Arc<dyn Scanner>) -> Self {
        let mut list = Self {
            kind,
            source,
            all,
            entries: UniqueList::new(),
        };
        list.recompute();
        list
    }

    pub fn kind(&self) -> &ListKind {
        &self.kind
    }

    pub fn label(&self) -> String {
        self.kind.title()
    }

    pub fn source(&self) -> &Arc<dyn Scanner> {
        &self.source
    }

    /// Recompute the list, rescanning the source first unless `soft`.
    ///
    /// A failed rescan still recomputes from the retained index before the
    /// error is returned.
    pub fn refresh(&mut self, soft: bool) -> Result<(), ScanError> {
        let rescan = if soft {
            Ok(())
        } else {
            self.source.rescan(false).map(|_| ())
        };
        if let Err(e) = &rescan {
            warn!(list = %self.kind, error = %e, "source rescan failed, using previous index");
        }
        self.recompute();
        rescan
    }

    fn recompute(&mut self) {
        self.entries.clear();
        for area in self.source.names() {
            let names = self.source.qualified_names(&area);
            let accepted = self
                .kind
                .accept(&area, names, self.source.as_ref(), self.all.as_ref());
            self.entries.extend(accepted);
        }
        debug!(list = %self.kind, entries = self.entries.len(), "list recomputed");
    }

    pub fn entries(&self) -> &UniqueList {
        &self.entries
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.entries.contains(name)
    }

    /// Drop one entry until the next refresh.
    pub fn remove(&mut self, name: &QualifiedName) -> bool {
        self.entries.remove(name)
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
