//! Environment facade for fractaldb.
//!
//! Opens a database tree, builds the per-category scanners behind their
//! auto-rescan gates and keeps the derived lists, the unseen list and the
//! seen tracker together.
//!
//! # Example
//!
//! ```rust,no_run
//! use fractaldb_env::{Environment, EnvironmentOptions, ListKind};
//!
//! let env = Environment::open("/data/fractals", EnvironmentOptions::default()).unwrap();
//! if let Some(pending) = env.list(&ListKind::Pending) {
//!     for name in pending.lock().iter() {
//!         println!("{name}");
//!     }
//! }
//! ```

mod environment;
mod error;
mod options;

pub use environment::{Environment, RescanResults};
pub use error::EnvError;
pub use options::{EnvironmentOptions, EnvironmentOptionsBuilder};

// Re-export the list types callers need alongside the environment
pub use fractaldb_lists::{DerivedList, ListKind, UnseenList};
