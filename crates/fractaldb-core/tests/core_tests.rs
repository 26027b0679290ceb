use fractaldb_core::{
    AreaName, ArtifactKind, Category, CategoryRoots, Handle, NameError, QualifiedName,
    ScannerConfig, Settings, has_image_data,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strum::IntoEnumIterator;
use tempfile::TempDir;

#[test]
fn test_sub_name_is_strict_prefix() {
    let names: Vec<AreaName> = ["a", "a.b", "a.b.c", "a.bc", "b", "b.a"]
        .into_iter()
        .map(|n| AreaName::parse(n).unwrap())
        .collect();

    for a in &names {
        for b in &names {
            if a.is_sub_name_of(b) {
                assert_ne!(a, b);
                assert!(a.depth() > b.depth());
                assert_eq!(&a.segments()[..b.depth()], b.segments());
            }
        }
        assert!(!a.is_sub_name_of(a));
    }

    let ab = AreaName::parse("a.b").unwrap();
    assert!(!AreaName::parse("a.bc").unwrap().is_sub_name_of(&ab));
    assert!(AreaName::parse("a.b.c").unwrap().is_sub_name_of(&ab));
}

#[test]
fn test_malformed_names_are_rejected() {
    for bad in ["", ".", "a..b", "a.", ".a", "a b", "a/b"] {
        assert!(
            matches!(AreaName::parse(bad), Err(NameError::Malformed { .. })),
            "{bad:?} should not parse"
        );
    }
    assert!(QualifiedName::parse("a.b-").is_err());
    assert!(QualifiedName::parse("a.b-x-y").is_err());
}

#[test]
fn test_qualified_name_order() {
    let ordered: Vec<String> = ["a.b-z", "a.b", "a.b-hires", "a", "a.c"]
        .into_iter()
        .map(|n| QualifiedName::parse(n).unwrap())
        .collect::<BTreeSet<_>>()
        .iter()
        .map(|n| n.to_string())
        .collect();

    assert_eq!(ordered, vec!["a", "a.b", "a.b-hires", "a.b-z", "a.c"]);
}

#[test]
fn test_names_from_artifact_paths() {
    let name = QualifiedName::from_path(Path::new("/db/rasters/root.sub-hires.mr")).unwrap();
    assert_eq!(name.area_name().to_string(), "root.sub");
    assert_eq!(name.qualifier(), Some("hires"));

    let name = QualifiedName::from_path(Path::new("root.sub.jpeg")).unwrap();
    assert!(!name.is_qualified());

    assert!(matches!(
        QualifiedName::from_path(Path::new("root.sub.txt")),
        Err(NameError::UnknownArtifact { .. })
    ));
}

#[test]
fn test_category_table() {
    for category in Category::iter() {
        assert!(!category.kinds().is_empty());
    }
    assert_eq!(
        Category::NewRaster.roots(),
        CategoryRoots::Property("raster.save.path")
    );
    assert_eq!(
        Category::PrioInfo.roots(),
        CategoryRoots::Property("info.prio.path")
    );
    assert!(Category::ImageData.accepts(ArtifactKind::RasterImage));
    assert!(!Category::ImageData.accepts(ArtifactKind::Info));
    assert!(!Category::All.accepts(ArtifactKind::Colormap));
    assert_eq!("new-raster".parse::<Category>().unwrap(), Category::NewRaster);
}

#[test]
fn test_handle_payload_is_lazy() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a.b.mr");
    fs::write(&path, b"raster bytes").unwrap();

    let handle = Handle::new(QualifiedName::parse("a.b").unwrap(), &path, ArtifactKind::Raster);
    assert!(!handle.is_loaded());
    assert_eq!(&*handle.data().unwrap(), b"raster bytes");
    assert!(handle.is_loaded());

    // Cached after the first successful load.
    fs::remove_file(&path).unwrap();
    assert!(handle.data().is_ok());

    let missing = Handle::new(
        QualifiedName::parse("a.c").unwrap(),
        temp.path().join("a.c.mr"),
        ArtifactKind::Raster,
    );
    assert!(missing.data().is_err());
    assert!(!missing.is_loaded());

    let info = Arc::new(Handle::new(
        QualifiedName::parse("a.b").unwrap(),
        temp.path().join("a.b.md"),
        ArtifactKind::Info,
    ));
    assert!(!has_image_data([&info]));
    assert!(has_image_data([&info, &Arc::new(handle)]));
}

#[test]
fn test_scanner_config_builder() {
    let config = ScannerConfig::builder()
        .label("db/all")
        .roots(vec![PathBuf::from("/db")])
        .kinds(Category::All.kinds().to_vec())
        .ignore_patterns(vec!["*-tmp.*".to_string()])
        .threads(2usize)
        .build()
        .unwrap();

    assert_eq!(config.label, "db/all");
    assert_eq!(config.threads, 2);
    assert!(!config.follow_symlinks);
    assert!(config.accepts(ArtifactKind::Raster));
    assert!(!config.accepts(ArtifactKind::Colormap));

    assert!(ScannerConfig::builder()
        .roots(Vec::<PathBuf>::new())
        .kinds(vec![ArtifactKind::Raster])
        .build()
        .is_err());
}

#[test]
fn test_settings_paths() {
    let mut settings = Settings::new("/db", Default::default());
    settings.set("raster.save.path", " new ; /abs/new2 ");
    settings.set("autorescan", "off");
    settings.set("site", "   ");

    assert_eq!(
        settings.path_list("raster.save.path"),
        vec![PathBuf::from("/db/new"), PathBuf::from("/abs/new2")]
    );
    assert!(!settings.switch("autorescan", true));
    assert_eq!(settings.get("site"), None);
    assert_eq!(settings.seen_list_path(), PathBuf::from("/db/seen.json"));
}
