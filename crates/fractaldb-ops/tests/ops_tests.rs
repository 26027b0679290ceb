use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use fractaldb_core::{Category, LocalStorage, QualifiedName, ScannerConfig, Storage};
use fractaldb_lists::{MemoryStore, SeenList, UnseenList};
use fractaldb_ops::{Relocation, RelocationError, RelocationPolicy, SeenTracker, SkipReason};
use fractaldb_scan::{DirectScanner, Scanner};
use tempfile::TempDir;

fn q(text: &str) -> QualifiedName {
    QualifiedName::parse(text).unwrap()
}

/// Local storage whose renames always fail, forcing the copy path.
struct NoRenameStorage;

impl Storage for NoRenameStorage {
    fn exists(&self, path: &Path) -> bool {
        LocalStorage.exists(path)
    }
    fn is_file(&self, path: &Path) -> bool {
        LocalStorage.is_file(path)
    }
    fn is_dir(&self, path: &Path) -> bool {
        LocalStorage.is_dir(path)
    }
    fn parent(&self, path: &Path) -> Option<PathBuf> {
        LocalStorage.parent(path)
    }
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        LocalStorage.canonicalize(path)
    }
    fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
        Err(io::Error::other("cross-device link"))
    }
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        LocalStorage.copy(from, to)
    }
    fn delete(&self, path: &Path) -> io::Result<()> {
        LocalStorage.delete(path)
    }
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        LocalStorage.create_dir_all(path)
    }
}

/// Renames fail and copies stop after writing part of the file.
struct BrokenCopyStorage;

impl Storage for BrokenCopyStorage {
    fn exists(&self, path: &Path) -> bool {
        LocalStorage.exists(path)
    }
    fn is_file(&self, path: &Path) -> bool {
        LocalStorage.is_file(path)
    }
    fn is_dir(&self, path: &Path) -> bool {
        LocalStorage.is_dir(path)
    }
    fn parent(&self, path: &Path) -> Option<PathBuf> {
        LocalStorage.parent(path)
    }
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        LocalStorage.canonicalize(path)
    }
    fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
        Err(io::Error::other("cross-device link"))
    }
    fn copy(&self, _from: &Path, to: &Path) -> io::Result<u64> {
        fs::write(to, "rast")?;
        Err(io::Error::other("no space left on device"))
    }
    fn delete(&self, path: &Path) -> io::Result<()> {
        LocalStorage.delete(path)
    }
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        LocalStorage.create_dir_all(path)
    }
}

struct Fixture {
    temp: TempDir,
    store: Arc<MemoryStore>,
    unseen: UnseenList,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("new")).unwrap();
        fs::write(root.join("new/a.b.mr"), "raster").unwrap();
        fs::write(root.join("new/a.c-hires.mr"), "raster").unwrap();
        fs::write(root.join("a.mr"), "raster").unwrap();

        let scanner = DirectScanner::new(ScannerConfig::for_category(root, Category::ImageData))
            .unwrap();
        scanner.rescan(false).unwrap();
        let store = Arc::new(MemoryStore::new());
        let unseen = UnseenList::new(
            Arc::new(scanner),
            SeenList::empty(Box::new(store.clone())),
        );
        Self {
            temp,
            store,
            unseen,
        }
    }

    fn root(&self) -> &Path {
        self.temp.path()
    }

    fn policy(&self) -> RelocationPolicy {
        RelocationPolicy {
            save_roots: vec![self.root().join("missing"), self.root().join("new")],
            raster_store: Some(self.root().join("seen")),
            variant_store: Some(self.root().join("variants")),
            readonly: false,
        }
    }
}

#[test]
fn test_observe_marks_seen_and_relocates() {
    let mut fixture = Fixture::new();
    let notified = Arc::new(AtomicUsize::new(0));
    let mut tracker = SeenTracker::new(Arc::new(LocalStorage), fixture.policy());
    {
        let notified = Arc::clone(&notified);
        tracker.on_seen_modified(move |_| {
            notified.fetch_add(1, Ordering::SeqCst);
        });
    }

    let file = fixture.root().join("new/a.b.mr");
    let report = tracker.observe(&file, &mut fixture.unseen);

    assert_eq!(report.name, Some(q("a.b")));
    assert!(report.seen_modified);
    assert!(report.persisted);
    assert!(!fixture.unseen.contains(&q("a.b")));
    assert_eq!(fixture.store.save_count(), 1);
    assert_eq!(notified.load(Ordering::SeqCst), 1);

    let target = fixture.root().join("seen").canonicalize().unwrap().join("a.b.mr");
    match report.relocation {
        Relocation::Moved { to, .. } => assert_eq!(to, target),
        other => panic!("expected a move, got {other:?}"),
    }
    assert!(!file.exists());
    assert!(target.is_file());
}

#[test]
fn test_variants_go_to_variant_store() {
    let mut fixture = Fixture::new();
    let tracker = SeenTracker::new(Arc::new(LocalStorage), fixture.policy());

    let report = tracker.observe(&fixture.root().join("new/a.c-hires.mr"), &mut fixture.unseen);
    assert!(report.relocation.is_moved());
    assert!(fixture.root().join("variants/a.c-hires.mr").is_file());
}

#[test]
fn test_second_observe_is_not_persisted_again() {
    let mut fixture = Fixture::new();
    let tracker = SeenTracker::new(Arc::new(LocalStorage), RelocationPolicy::default());
    let file = fixture.root().join("a.mr");

    let first = tracker.observe(&file, &mut fixture.unseen);
    let second = tracker.observe(&file, &mut fixture.unseen);

    assert!(first.seen_modified);
    assert!(!second.seen_modified);
    assert_eq!(fixture.store.save_count(), 1);
    assert!(matches!(
        second.relocation,
        Relocation::Skipped(SkipReason::NoStorePath)
    ));
    assert!(file.exists());
}

#[test]
fn test_no_relocation_when_store_is_parent() {
    let mut fixture = Fixture::new();
    let mut policy = fixture.policy();
    policy.raster_store = Some(fixture.root().join("new"));
    let tracker = SeenTracker::new(Arc::new(LocalStorage), policy);

    let file = fixture.root().join("new/a.b.mr");
    let report = tracker.observe(&file, &mut fixture.unseen);
    assert!(matches!(
        report.relocation,
        Relocation::Skipped(SkipReason::AlreadyInStore)
    ));
    assert!(file.is_file());
}

#[test]
fn test_outside_save_roots_and_readonly() {
    let mut fixture = Fixture::new();
    let tracker = SeenTracker::new(Arc::new(LocalStorage), fixture.policy());
    let report = tracker.observe(&fixture.root().join("a.mr"), &mut fixture.unseen);
    assert!(matches!(
        report.relocation,
        Relocation::Skipped(SkipReason::OutsideSaveRoots)
    ));

    let mut policy = fixture.policy();
    policy.readonly = true;
    let tracker = SeenTracker::new(Arc::new(LocalStorage), policy);
    let file = fixture.root().join("new/a.b.mr");
    let report = tracker.observe(&file, &mut fixture.unseen);

    // Read-only databases still record the name as seen.
    assert!(report.seen_modified);
    assert!(matches!(
        report.relocation,
        Relocation::Skipped(SkipReason::ReadOnly)
    ));
    assert!(file.is_file());
}

#[test]
fn test_copy_fallback_removes_original() {
    let mut fixture = Fixture::new();
    let tracker = SeenTracker::new(Arc::new(NoRenameStorage), fixture.policy());

    let file = fixture.root().join("new/a.b.mr");
    let report = tracker.observe(&file, &mut fixture.unseen);

    assert!(report.relocation.is_moved());
    assert!(!file.exists());
    let moved: Vec<_> = fs::read_dir(fixture.root().join("seen")).unwrap().collect();
    assert_eq!(moved.len(), 1);
}

#[test]
fn test_existing_store_file_is_not_replaced() {
    let mut fixture = Fixture::new();
    fs::create_dir_all(fixture.root().join("seen")).unwrap();
    fs::write(fixture.root().join("seen/a.b.mr"), "canonical").unwrap();
    let tracker = SeenTracker::new(Arc::new(LocalStorage), fixture.policy());

    let file = fixture.root().join("new/a.b.mr");
    let report = tracker.observe(&file, &mut fixture.unseen);

    assert!(report.seen_modified);
    assert!(matches!(
        report.relocation,
        Relocation::Failed(RelocationError::TargetExists { .. })
    ));
    assert_eq!(fs::read_to_string(&file).unwrap(), "raster");
    assert_eq!(
        fs::read_to_string(fixture.root().join("seen/a.b.mr")).unwrap(),
        "canonical"
    );
}

#[test]
fn test_failed_copy_leaves_nothing_behind() {
    let mut fixture = Fixture::new();
    let tracker = SeenTracker::new(Arc::new(BrokenCopyStorage), fixture.policy());

    let file = fixture.root().join("new/a.b.mr");
    let report = tracker.observe(&file, &mut fixture.unseen);

    assert!(matches!(
        report.relocation,
        Relocation::Failed(RelocationError::Move { .. })
    ));
    assert_eq!(fs::read_to_string(&file).unwrap(), "raster");
    assert!(!fixture.root().join("seen/a.b.mr").exists());

    // A retry with working storage succeeds.
    let tracker = SeenTracker::new(Arc::new(LocalStorage), fixture.policy());
    let report = tracker.observe(&file, &mut fixture.unseen);
    assert!(report.relocation.is_moved());
    assert!(fixture.root().join("seen/a.b.mr").is_file());
}

#[test]
fn test_unresolvable_file_name() {
    let mut fixture = Fixture::new();
    let tracker = SeenTracker::new(Arc::new(LocalStorage), fixture.policy());
    let file = fixture.root().join("new/bad..name.mr");
    fs::write(&file, "x").unwrap();

    let report = tracker.observe(&file, &mut fixture.unseen);
    assert!(report.name.is_none());
    assert!(matches!(
        report.relocation,
        Relocation::Failed(RelocationError::Resolve { .. })
    ));
    assert_eq!(fixture.store.save_count(), 0);
    assert!(file.exists());
}

#[test]
fn test_failed_persistence_still_notifies() {
    let mut fixture = Fixture::new();
    fixture.store.set_failing(true);
    let tracker = SeenTracker::new(Arc::new(LocalStorage), RelocationPolicy::default());

    let report = tracker.observe(&fixture.root().join("a.mr"), &mut fixture.unseen);
    assert!(report.seen_modified);
    assert!(!report.persisted);
    assert!(!fixture.unseen.contains(&q("a")));
}
