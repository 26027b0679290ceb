//! Delegating scanners: the plain proxy and the auto-rescan gate.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use fractaldb_core::{AreaName, Handle, QualifiedName, ScanError};

use crate::scanner::{
    NameFilter, ScanSummary, Scanner, SubNameQuery, scan_has_sub_names, scan_sub_names,
};

/// Scanner that forwards every call to an inner scanner.
#[derive(Clone)]
pub struct ProxyScanner {
    inner: Arc<dyn Scanner>,
}

impl ProxyScanner {
    pub fn new(inner: Arc<dyn Scanner>) -> Self {
        Self { inner }
    }

    /// The wrapped scanner.
    pub fn inner(&self) -> &Arc<dyn Scanner> {
        &self.inner
    }
}

impl Scanner for ProxyScanner {
    fn label(&self) -> &str {
        self.inner.label()
    }

    fn rescan(&self, verbose: bool) -> Result<ScanSummary, ScanError> {
        self.inner.rescan(verbose)
    }

    fn names(&self) -> BTreeSet<AreaName> {
        self.inner.names()
    }

    fn qualified_names(&self, name: &AreaName) -> BTreeSet<QualifiedName> {
        self.inner.qualified_names(name)
    }

    fn handle(&self, name: &QualifiedName) -> Option<Arc<Handle>> {
        self.inner.handle(name)
    }

    fn handles(&self, name: &AreaName) -> Vec<Arc<Handle>> {
        self.inner.handles(name)
    }

    fn sub_name_query(&self) -> Option<&dyn SubNameQuery> {
        self.inner.sub_name_query()
    }
}

/// Process-wide switch enabling automatic rescans.
///
/// Clones share the same flag. The value is read at every gate check.
#[derive(Debug, Clone)]
pub struct AutoRescanFlag(Arc<AtomicBool>);

impl AutoRescanFlag {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }
}

impl Default for AutoRescanFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Proxy that suppresses rescans while the auto-rescan flag is off.
///
/// Always answers sub-name queries: natively when the inner scanner can,
/// otherwise by a linear scan over its names.
#[derive(Clone)]
pub struct AutoRescanGate {
    proxy: ProxyScanner,
    flag: AutoRescanFlag,
}

impl AutoRescanGate {
    pub fn new(inner: Arc<dyn Scanner>, flag: AutoRescanFlag) -> Self {
        Self {
            proxy: ProxyScanner::new(inner),
            flag,
        }
    }

    /// The gated scanner.
    pub fn inner(&self) -> &Arc<dyn Scanner> {
        self.proxy.inner()
    }

    /// The flag this gate consults.
    pub fn flag(&self) -> &AutoRescanFlag {
        &self.flag
    }
}

impl Scanner for AutoRescanGate {
    fn label(&self) -> &str {
        self.proxy.label()
    }

    fn rescan(&self, verbose: bool) -> Result<ScanSummary, ScanError> {
        if !self.flag.is_enabled() {
            debug!(scanner = %self.label(), "auto rescan disabled, keeping index");
            return Ok(ScanSummary::skipped(self.label()));
        }
        self.proxy.rescan(verbose)
    }

    fn names(&self) -> BTreeSet<AreaName> {
        self.proxy.names()
    }

    fn qualified_names(&self, name: &AreaName) -> BTreeSet<QualifiedName> {
        self.proxy.qualified_names(name)
    }

    fn handle(&self, name: &QualifiedName) -> Option<Arc<Handle>> {
        self.proxy.handle(name)
    }

    fn handles(&self, name: &AreaName) -> Vec<Arc<Handle>> {
        self.proxy.handles(name)
    }

    fn sub_name_query(&self) -> Option<&dyn SubNameQuery> {
        Some(self)
    }
}

impl SubNameQuery for AutoRescanGate {
    fn sub_names(&self, name: &AreaName, filter: NameFilter<'_>) -> BTreeSet<AreaName> {
        match self.proxy.sub_name_query() {
            Some(query) => query.sub_names(name, filter),
            None => scan_sub_names(self.inner().as_ref(), name, filter),
        }
    }

    fn has_sub_names(&self, name: &AreaName, filter: NameFilter<'_>) -> bool {
        match self.proxy.sub_name_query() {
            Some(query) => query.has_sub_names(name, filter),
            None => scan_has_sub_names(self.inner().as_ref(), name, filter),
        }
    }
}
