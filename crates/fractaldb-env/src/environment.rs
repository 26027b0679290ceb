//! The environment: one opened database tree with its scanners and lists.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use strum::IntoEnumIterator;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use fractaldb_core::settings::keys;
use fractaldb_core::{
    AreaName, Category, Handle, QualifiedName, ScanError, Settings, Storage,
};
use fractaldb_lists::{DerivedList, JsonFileStore, ListKind, ListStore, SeenList, UnseenList};
use fractaldb_ops::{RelocationPolicy, SeenReport, SeenTracker, backup_file, backup_folder};
use fractaldb_scan::{AutoRescanFlag, AutoRescanGate, Context, ScanSummary, Scanner, category_scanner};

use crate::error::EnvError;
use crate::options::EnvironmentOptions;

/// Per-category rescan outcomes.
pub type RescanResults = Vec<(Category, Result<ScanSummary, ScanError>)>;

/// The lists every environment keeps up to date.
struct Lists {
    new_rasters: Option<Mutex<DerivedList>>,
    variants: Mutex<DerivedList>,
    leafs: Mutex<DerivedList>,
    pending: Mutex<DerivedList>,
}

impl Lists {
    fn get(&self, kind: &ListKind) -> Option<&Mutex<DerivedList>> {
        match kind {
            ListKind::NewRasters => self.new_rasters.as_ref(),
            ListKind::Variants => Some(&self.variants),
            ListKind::Leafs => Some(&self.leafs),
            ListKind::Pending => Some(&self.pending),
            ListKind::DeadEnds(_) => None,
        }
    }

    fn iter(&self) -> impl Iterator<Item = &Mutex<DerivedList>> {
        self.new_rasters
            .iter()
            .chain([&self.variants, &self.leafs, &self.pending])
    }
}

/// Facade over an opened context tree.
///
/// Holds one scanner per available category, an auto-rescan gate in front
/// of each, the derived lists fed by the gates and the seen tracker.
pub struct Environment {
    context: Context,
    flag: AutoRescanFlag,
    verbose: bool,
    scanners: BTreeMap<Category, Arc<dyn Scanner>>,
    gates: BTreeMap<Category, Arc<AutoRescanGate>>,
    lists: Lists,
    unseen: Mutex<UnseenList>,
    tracker: SeenTracker,
    storage: Arc<dyn Storage>,
    default_colormap: Option<Arc<Handle>>,
}

impl Environment {
    /// Open the database tree rooted at `root`.
    pub fn open(root: impl AsRef<Path>, options: EnvironmentOptions) -> Result<Self, EnvError> {
        let context = Context::open(root)?;

        info!("Image base layout:");
        for line in context.layout() {
            info!("  {line}");
        }
        let database = context.database();
        if let Some(site) = database.property(keys::SITE) {
            info!("Site name : {site}");
        }
        if let Some(user) = database.property(keys::USER) {
            info!("Site owner: {user}");
        }

        let auto_rescan = options
            .auto_rescan
            .unwrap_or_else(|| database.settings().switch(keys::AUTORESCAN, true));
        let flag = AutoRescanFlag::new(auto_rescan);

        let mut scanners = BTreeMap::new();
        let mut gates = BTreeMap::new();
        for category in Category::iter() {
            let Some(scanner) = category_scanner(&context, category) else {
                debug!(%category, "category not available");
                continue;
            };
            gates.insert(
                category,
                Arc::new(AutoRescanGate::new(Arc::clone(&scanner), flag.clone())),
            );
            scanners.insert(category, scanner);
        }

        if options.initial_scan {
            for (category, result) in rescan_all(&scanners, options.verbose) {
                if let Err(e) = result {
                    warn!(%category, error = %e, "initial scan failed");
                }
            }
        }

        let gate = |category: Category| -> Result<Arc<dyn Scanner>, EnvError> {
            gates
                .get(&category)
                .map(|g| Arc::clone(g) as Arc<dyn Scanner>)
                .ok_or_else(|| EnvError::MissingCategory {
                    category: category.to_string(),
                })
        };
        let all = gate(Category::All)?;
        let image_data = gate(Category::ImageData)?;

        let lists = Lists {
            new_rasters: gate(Category::NewRaster).ok().map(|source| {
                Mutex::new(DerivedList::new(ListKind::NewRasters, source, all.clone()))
            }),
            variants: Mutex::new(DerivedList::new(
                ListKind::Variants,
                image_data.clone(),
                all.clone(),
            )),
            leafs: Mutex::new(DerivedList::new(
                ListKind::Leafs,
                image_data.clone(),
                all.clone(),
            )),
            pending: Mutex::new(DerivedList::new(
                ListKind::Pending,
                image_data.clone(),
                all.clone(),
            )),
        };

        let store: Box<dyn ListStore> = match options.seen_store {
            Some(store) => Box::new(store),
            None => Box::new(JsonFileStore::new(database.settings().seen_list_path())),
        };
        let seen = SeenList::open(store)?;
        info!(location = %seen.location(), seen = seen.len(), "seen list loaded");
        let unseen = UnseenList::new(image_data, seen);

        let default_colormap = resolve_colormap(database.settings(), scanners.get(&Category::Colormap));

        let policy = RelocationPolicy::from_settings(database.settings(), database.is_readonly());
        let tracker = SeenTracker::new(Arc::clone(&options.storage), policy);

        Ok(Self {
            context,
            flag,
            verbose: options.verbose,
            scanners,
            gates,
            lists,
            unseen: Mutex::new(unseen),
            tracker,
            storage: options.storage,
            default_colormap,
        })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Settings of the root database.
    pub fn settings(&self) -> &Settings {
        self.context.database().settings()
    }

    /// Property of the root database.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.context.database().property(key)
    }

    /// Whether the database with `label` is read-only.
    pub fn is_readonly(&self, label: &str) -> Result<bool, EnvError> {
        self.context
            .context(label)
            .map(|c| c.database().is_readonly())
            .ok_or_else(|| EnvError::UnknownDatabase {
                label: label.to_string(),
            })
    }

    pub fn auto_rescan_flag(&self) -> &AutoRescanFlag {
        &self.flag
    }

    pub fn is_auto_rescan(&self) -> bool {
        self.flag.is_enabled()
    }

    pub fn set_auto_rescan(&self, enabled: bool) {
        self.flag.set(enabled);
    }

    /// Raw scanner of a category, bypassing the gate.
    pub fn scanner(&self, category: Category) -> Option<&Arc<dyn Scanner>> {
        self.scanners.get(&category)
    }

    /// Gated scanner of a category.
    pub fn gated_scanner(&self, category: Category) -> Option<&Arc<AutoRescanGate>> {
        self.gates.get(&category)
    }

    /// Categories available in the root database.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.scanners.keys().copied()
    }

    /// Rescan every category, then refresh the lists from the new indexes.
    pub fn rescan(&self, verbose: bool) -> RescanResults {
        let results = rescan_all(&self.scanners, verbose || self.verbose);
        self.refresh_lists();
        results
    }

    /// Rescan only if auto rescan is enabled. `None` when suppressed.
    pub fn auto_rescan(&self, verbose: bool) -> Option<RescanResults> {
        if !self.flag.is_enabled() {
            debug!("auto rescan disabled");
            return None;
        }
        Some(self.rescan(verbose))
    }

    /// Rescan on a blocking worker thread.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_rescan(self: &Arc<Self>, verbose: bool) -> JoinHandle<RescanResults> {
        let env = Arc::clone(self);
        tokio::task::spawn_blocking(move || env.rescan(verbose))
    }

    fn refresh_lists(&self) {
        for list in self.lists.iter() {
            // Soft: the scanners have just been rescanned.
            let _ = list.lock().refresh(true);
        }
        let _ = self.unseen.lock().refresh(true);
    }

    /// One of the standing lists. Dead ends are built with [`Self::dead_ends`].
    pub fn list(&self, kind: &ListKind) -> Option<&Mutex<DerivedList>> {
        self.lists.get(kind)
    }

    /// Refresh a list with a rescan of its source, even while auto rescan
    /// is off. The shared flag is left untouched.
    pub fn refresh_forced(&self, kind: &ListKind) -> Option<Result<(), ScanError>> {
        let list = self.lists.get(kind)?;
        let source = match kind {
            ListKind::NewRasters => Category::NewRaster,
            _ => Category::ImageData,
        };
        let rescan = self.scanners.get(&source)?.rescan(self.verbose).map(|_| ());
        if let Err(e) = &rescan {
            warn!(list = %kind, error = %e, "forced rescan failed, using previous index");
        }
        Some(list.lock().refresh(true).and(rescan))
    }

    /// Leaf areas below `base`.
    pub fn dead_ends(&self, base: AreaName) -> Option<DerivedList> {
        let all = self.gates.get(&Category::All)?;
        let all: Arc<dyn Scanner> = Arc::clone(all) as Arc<dyn Scanner>;
        Some(DerivedList::new(ListKind::DeadEnds(base), all.clone(), all))
    }

    pub fn unseen(&self) -> &Mutex<UnseenList> {
        &self.unseen
    }

    /// Primary image-data handle of a name.
    pub fn image_data(&self, name: &QualifiedName) -> Option<Arc<Handle>> {
        self.scanners.get(&Category::ImageData)?.handle(name)
    }

    /// Image data of an area: its unqualified rendering if there is one,
    /// otherwise the first variant carrying image data.
    pub fn image_data_for_area(&self, area: &AreaName) -> Option<Arc<Handle>> {
        let scanner = self.scanners.get(&Category::ImageData)?;
        scanner
            .handle(&QualifiedName::new(area.clone()))
            .filter(|h| h.has_image_data())
            .or_else(|| scanner.handles(area).into_iter().find(|h| h.has_image_data()))
    }

    /// The colormap named by `colormap.default`, if it was found.
    pub fn default_colormap(&self) -> Option<&Arc<Handle>> {
        self.default_colormap.as_ref()
    }

    pub fn tracker(&self) -> &SeenTracker {
        &self.tracker
    }

    /// Mutable tracker access, e.g. to register listeners.
    pub fn tracker_mut(&mut self) -> &mut SeenTracker {
        &mut self.tracker
    }

    /// A raster file has been looked at.
    pub fn observe_raster(&self, path: &Path) -> SeenReport {
        let mut unseen = self.unseen.lock();
        self.tracker.observe(path, &mut unseen)
    }

    /// Move `path` into the backup folder of `category`.
    ///
    /// `Ok(None)` when no backup folder is configured.
    pub fn backup_file(&self, path: &Path, category: Category) -> Result<Option<PathBuf>, EnvError> {
        let storage = self.storage.as_ref();
        let Some(folder) = backup_folder(storage, self.settings(), category)? else {
            debug!(%category, "no backup folder configured");
            return Ok(None);
        };
        Ok(Some(backup_file(storage, path, &folder)?))
    }
}

fn rescan_all(scanners: &BTreeMap<Category, Arc<dyn Scanner>>, verbose: bool) -> RescanResults {
    scanners
        .iter()
        .map(|(category, scanner)| (*category, scanner.rescan(verbose)))
        .collect()
}

fn resolve_colormap(
    settings: &Settings,
    scanner: Option<&Arc<dyn Scanner>>,
) -> Option<Arc<Handle>> {
    let Some(name) = settings.get(keys::DEFAULT_COLORMAP) else {
        info!("no default colormap");
        return None;
    };
    let qualified = match QualifiedName::parse(name) {
        Ok(q) => q,
        Err(e) => {
            warn!(colormap = name, error = %e, "invalid default colormap name");
            return None;
        }
    };
    let handle = scanner.and_then(|s| s.handle(&qualified));
    if handle.is_none() {
        warn!(colormap = name, "default colormap not found");
    }
    handle
}
