//! Options for opening an environment.

use std::sync::Arc;

use derive_builder::Builder;

use fractaldb_core::{LocalStorage, Storage};
use fractaldb_lists::ListStore;

/// How an [`crate::Environment`] is opened.
#[derive(Clone, Builder)]
pub struct EnvironmentOptions {
    /// Log scan summaries at info level.
    #[builder(default = "false")]
    pub verbose: bool,

    /// Scan every category while opening.
    #[builder(default = "true")]
    pub initial_scan: bool,

    /// Override the database's `autorescan` property.
    #[builder(default, setter(strip_option))]
    pub auto_rescan: Option<bool>,

    /// Seen list backend; the database's JSON file when unset.
    #[builder(default, setter(strip_option))]
    pub seen_store: Option<Arc<dyn ListStore>>,

    /// File access used for relocation and backups.
    #[builder(default = "Arc::new(LocalStorage) as Arc<dyn Storage>")]
    pub storage: Arc<dyn Storage>,
}

impl EnvironmentOptions {
    pub fn builder() -> EnvironmentOptionsBuilder {
        EnvironmentOptionsBuilder::default()
    }
}

impl Default for EnvironmentOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            initial_scan: true,
            auto_rescan: None,
            seen_store: None,
            storage: Arc::new(LocalStorage),
        }
    }
}
