//! Reacting to rasters that have been looked at.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use fractaldb_core::{QualifiedName, Storage};
use fractaldb_lists::UnseenList;

use crate::error::RelocationError;
use crate::relocation::{Relocation, RelocationPolicy};

/// Callback invoked when a name leaves the unseen list.
pub type SeenListener = Box<dyn Fn(&QualifiedName) + Send + Sync>;

/// What observing one file did.
#[derive(Debug)]
pub struct SeenReport {
    /// The resolved name, if the file name parsed.
    pub name: Option<QualifiedName>,
    /// The name was unseen and has been marked seen.
    pub seen_modified: bool,
    /// The seen list was written after the change.
    pub persisted: bool,
    pub relocation: Relocation,
}

/// Marks observed rasters seen and moves them into the seen store.
pub struct SeenTracker {
    storage: Arc<dyn Storage>,
    policy: RelocationPolicy,
    listeners: Vec<SeenListener>,
}

impl SeenTracker {
    pub fn new(storage: Arc<dyn Storage>, policy: RelocationPolicy) -> Self {
        Self {
            storage,
            policy,
            listeners: Vec::new(),
        }
    }

    pub fn policy(&self) -> &RelocationPolicy {
        &self.policy
    }

    /// Register a seen-modified listener.
    pub fn on_seen_modified(&mut self, listener: impl Fn(&QualifiedName) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Handle a raster file that has just been observed.
    pub fn observe(&self, path: &Path, unseen: &mut UnseenList) -> SeenReport {
        let name = match QualifiedName::from_path(path) {
            Ok(name) => name,
            Err(source) => {
                return SeenReport {
                    name: None,
                    seen_modified: false,
                    persisted: false,
                    relocation: Relocation::Failed(RelocationError::Resolve {
                        path: path.to_path_buf(),
                        source,
                    }),
                };
            }
        };

        let mut seen_modified = false;
        let mut persisted = false;
        if unseen.contains(&name) {
            // A failed save leaves the removal in memory; it is logged there.
            persisted = unseen.remove(&name).is_ok();
            seen_modified = true;
            for listener in &self.listeners {
                listener(&name);
            }
        } else {
            debug!(%name, "already seen");
        }

        let relocation = self.policy.relocate(self.storage.as_ref(), path, &name);
        SeenReport {
            name: Some(name),
            seen_modified,
            persisted,
            relocation,
        }
    }
}
