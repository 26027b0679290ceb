//! Artifact scanning engine for fractaldb.
//!
//! This crate indexes the image artifacts stored under a database root and
//! composes those indexes into the layers the rest of the workspace queries.
//!
//! # Overview
//!
//! - [`DirectScanner`] walks its roots in parallel via jwalk and publishes a
//!   fresh [`ScanIndex`] atomically on every rescan
//! - [`DistributedScanner`] federates the scanners of nested databases
//! - [`ProxyScanner`] and [`AutoRescanGate`] wrap another scanner
//! - [`Context`] opens a database tree from its `fractaldb.toml` files
//!
//! # Example
//!
//! ```rust,no_run
//! use fractaldb_scan::{Category, Context, Scanner, category_scanner};
//!
//! let context = Context::open("/data/fractals").unwrap();
//! let scanner = category_scanner(&context, Category::All).unwrap();
//! scanner.rescan(false).unwrap();
//!
//! for name in scanner.names() {
//!     println!("{name}");
//! }
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use fractaldb_scan::{Category, DirectScanner, ScannerConfig, Scanner};
//!
//! let config = ScannerConfig::for_category("/data/fractals", Category::All);
//! let scanner = DirectScanner::new(config).unwrap();
//! let mut progress_rx = scanner.subscribe();
//!
//! scanner.rescan(false).unwrap();
//! while let Ok(progress) = progress_rx.try_recv() {
//!     println!("Indexed {} artifacts", progress.artifacts_found);
//! }
//! ```

mod context;
mod direct;
mod distributed;
mod index;
mod progress;
mod proxy;
mod scanner;

pub use context::{Context, Database, SCAN_IGNORE_KEY};
pub use direct::DirectScanner;
pub use distributed::{DistributedScanner, FederationMember, category_scanner};
pub use index::ScanIndex;
pub use progress::ScanProgress;
pub use proxy::{AutoRescanFlag, AutoRescanGate, ProxyScanner};
pub use scanner::{
    MemberFailure, NameFilter, ScanSummary, Scanner, SubNameQuery, has_sub_names_of,
    scan_has_sub_names, scan_sub_names, sub_names_of,
};

// Re-export core types for convenience
pub use fractaldb_core::{
    AreaName, ArtifactKind, Category, ConfigError, Handle, QualifiedName, ScanError, ScanWarning,
    ScannerConfig, WarningKind,
};
