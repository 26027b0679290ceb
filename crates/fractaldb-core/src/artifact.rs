//! Artifact kinds and the database categories built from them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Kind of an artifact file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Raw raster data.
    Raster,
    /// Raster data combined with a rendered image.
    RasterImage,
    /// Area information record.
    Info,
    /// Rendered image.
    Image,
    /// Colormap.
    Colormap,
}

impl ArtifactKind {
    /// All known kinds.
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::Raster,
        ArtifactKind::RasterImage,
        ArtifactKind::Info,
        ArtifactKind::Image,
        ArtifactKind::Colormap,
    ];

    /// Map a file extension (without dot) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mr" => Some(Self::Raster),
            "mri" => Some(Self::RasterImage),
            "md" => Some(Self::Info),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            "mc" => Some(Self::Colormap),
            _ => None,
        }
    }

    /// Canonical file extension for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Raster => "mr",
            Self::RasterImage => "mri",
            Self::Info => "md",
            Self::Image => "png",
            Self::Colormap => "mc",
        }
    }

    /// Kind of the file at `path`, if it is an artifact.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Split `stem.ext` into the name part and the artifact kind.
    pub fn split_file_name(file_name: &str) -> Option<(&str, Self)> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Self::from_extension(ext).map(|kind| (stem, kind))
    }

    /// Whether artifacts of this kind carry image data.
    pub fn has_image_data(&self) -> bool {
        matches!(self, Self::Raster | Self::RasterImage)
    }
}

/// Where the storage roots of a category come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryRoots {
    /// The database root directory.
    Database,
    /// The paths listed under a settings key.
    Property(&'static str),
}

/// A category of artifacts a database exposes a scanner for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    All,
    Raster,
    RasterImage,
    Info,
    PrioInfo,
    Meta,
    ImageData,
    NewRaster,
    Colormap,
}

impl Category {
    /// Artifact kinds included in this category.
    pub fn kinds(&self) -> &'static [ArtifactKind] {
        use ArtifactKind::*;
        match self {
            Self::All => &[Raster, RasterImage, Info, Image],
            Self::Raster | Self::NewRaster => &[Raster],
            Self::RasterImage => &[RasterImage],
            Self::Info | Self::PrioInfo => &[Info],
            Self::Meta => &[Raster, RasterImage, Info],
            Self::ImageData => &[Raster, RasterImage],
            Self::Colormap => &[Colormap],
        }
    }

    /// Source of the storage roots scanned for this category.
    pub fn roots(&self) -> CategoryRoots {
        match self {
            Self::PrioInfo => CategoryRoots::Property(crate::settings::keys::PRIO_INFO_PATH),
            Self::NewRaster => CategoryRoots::Property(crate::settings::keys::RASTER_SAVE_PATH),
            _ => CategoryRoots::Database,
        }
    }

    /// Whether a file of `kind` belongs to this category.
    pub fn accepts(&self, kind: ArtifactKind) -> bool {
        self.kinds().contains(&kind)
    }
}
