//! The scanner abstraction shared by every index layer.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use fractaldb_core::{AreaName, Handle, QualifiedName, ScanError};

/// Optional predicate restricting sub-name queries.
pub type NameFilter<'a> = Option<&'a dyn Fn(&AreaName) -> bool>;

/// A federation member that failed to rescan.
#[derive(Debug, Clone)]
pub struct MemberFailure {
    /// Label of the failed member.
    pub label: String,
    /// Human-readable failure.
    pub message: String,
}

/// Outcome of a rescan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Label of the scanner that ran.
    pub label: String,
    /// Number of logical names indexed afterwards.
    pub names: usize,
    /// Number of artifact files indexed afterwards.
    pub artifacts: usize,
    /// Number of non-fatal warnings.
    pub warnings: usize,
    /// The rescan was suppressed and the index left untouched.
    pub skipped: bool,
    /// Members of a federation that failed and kept their previous index.
    pub failed_members: Vec<MemberFailure>,
    /// Time spent scanning.
    pub elapsed: Duration,
}

impl ScanSummary {
    /// Summary for a suppressed rescan.
    pub fn skipped(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            skipped: true,
            ..Self::default()
        }
    }

    /// Whether only part of a federation was rescanned.
    pub fn is_partial(&self) -> bool {
        !self.failed_members.is_empty()
    }
}

/// Index over a storage root mapping names to artifact handles.
///
/// Implementations swap their index atomically on [`Scanner::rescan`];
/// every other call reads a consistent snapshot.
pub trait Scanner: Send + Sync {
    /// Label used in logs.
    fn label(&self) -> &str;

    /// Re-walk storage and replace the index. On failure the previous
    /// index stays in place.
    fn rescan(&self, verbose: bool) -> Result<ScanSummary, ScanError>;

    /// Logical names with at least one artifact.
    fn names(&self) -> BTreeSet<AreaName>;

    /// Qualified names registered under a logical name.
    fn qualified_names(&self, name: &AreaName) -> BTreeSet<QualifiedName>;

    /// Resolve a qualified name. Absence is not an error.
    fn handle(&self, name: &QualifiedName) -> Option<Arc<Handle>>;

    /// Handles of all variants of a logical name.
    fn handles(&self, name: &AreaName) -> Vec<Arc<Handle>>;

    /// Whether a qualified name resolves.
    fn contains(&self, name: &QualifiedName) -> bool {
        self.handle(name).is_some()
    }

    /// Sub-name query capability, if the scanner supports it natively.
    fn sub_name_query(&self) -> Option<&dyn SubNameQuery> {
        None
    }
}

/// Hierarchy queries over the names a scanner knows about.
pub trait SubNameQuery {
    /// Immediate child names of `name` that have at least one artifact.
    fn sub_names(&self, name: &AreaName, filter: NameFilter<'_>) -> BTreeSet<AreaName>;

    /// Whether `name` has at least one matching immediate child.
    fn has_sub_names(&self, name: &AreaName, filter: NameFilter<'_>) -> bool;
}

fn accepted(filter: NameFilter<'_>, name: &AreaName) -> bool {
    filter.is_none_or(|f| f(name))
}

/// Sub-names computed by a linear scan over all names.
pub fn scan_sub_names(
    scanner: &dyn Scanner,
    name: &AreaName,
    filter: NameFilter<'_>,
) -> BTreeSet<AreaName> {
    scanner
        .names()
        .into_iter()
        .filter(|n| n.is_direct_sub_name_of(name) && accepted(filter, n))
        .collect()
}

/// Linear-scan variant of [`SubNameQuery::has_sub_names`].
pub fn scan_has_sub_names(scanner: &dyn Scanner, name: &AreaName, filter: NameFilter<'_>) -> bool {
    scanner
        .names()
        .iter()
        .any(|n| n.is_direct_sub_name_of(name) && accepted(filter, n))
}

/// Sub-names of `name`, using the scanner's capability when available.
pub fn sub_names_of(
    scanner: &dyn Scanner,
    name: &AreaName,
    filter: NameFilter<'_>,
) -> BTreeSet<AreaName> {
    match scanner.sub_name_query() {
        Some(query) => query.sub_names(name, filter),
        None => scan_sub_names(scanner, name, filter),
    }
}

/// Whether `name` has sub-names, using the capability when available.
pub fn has_sub_names_of(scanner: &dyn Scanner, name: &AreaName, filter: NameFilter<'_>) -> bool {
    match scanner.sub_name_query() {
        Some(query) => query.has_sub_names(name, filter),
        None => scan_has_sub_names(scanner, name, filter),
    }
}

/// Filter helper for index-backed implementations.
pub(crate) fn filter_children<'a>(
    children: impl IntoIterator<Item = &'a AreaName>,
    filter: NameFilter<'_>,
) -> BTreeSet<AreaName> {
    children
        .into_iter()
        .filter(|n| accepted(filter, n))
        .cloned()
        .collect()
}

/// Any-match helper for index-backed implementations.
pub(crate) fn any_child<'a>(
    children: impl IntoIterator<Item = &'a AreaName>,
    filter: NameFilter<'_>,
) -> bool {
    children.into_iter().any(|n| accepted(filter, n))
}
