//! Hierarchical area names and their qualified variants.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactKind;
use crate::error::NameError;

/// Separator between hierarchy segments.
pub const SEGMENT_SEPARATOR: char = '.';

/// Separator between an area name and its qualifier.
pub const QUALIFIER_SEPARATOR: char = '-';

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A dotted hierarchical path identifying an area, e.g. `root.sub.subsub`.
///
/// Equality, ordering and containment are structural over the segment
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AreaName {
    segments: Vec<CompactString>,
}

impl AreaName {
    /// Parse a dotted path into an area name.
    pub fn parse(path: &str) -> Result<Self, NameError> {
        let segments: Vec<CompactString> = path
            .split(SEGMENT_SEPARATOR)
            .map(CompactString::new)
            .collect();

        if let Some(bad) = segments.iter().find(|s| !valid_segment(s)) {
            return Err(NameError::Malformed {
                input: path.to_string(),
                reason: if bad.is_empty() {
                    "empty segment".to_string()
                } else {
                    format!("invalid segment '{bad}'")
                },
            });
        }

        Ok(Self { segments })
    }

    /// Build a name directly from segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, NameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        let segments: Vec<CompactString> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(NameError::Malformed {
                input: String::new(),
                reason: "no segments".to_string(),
            });
        }
        if let Some(bad) = segments.iter().find(|s| !valid_segment(s)) {
            return Err(NameError::Malformed {
                input: segments.join("."),
                reason: format!("invalid segment '{bad}'"),
            });
        }
        Ok(Self { segments })
    }

    /// The hierarchy segments of this name.
    pub fn segments(&self) -> &[CompactString] {
        &self.segments
    }

    /// Number of hierarchy levels.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The last segment.
    pub fn last_segment(&self) -> &str {
        // A parsed name always has at least one segment.
        self.segments.last().map(|s| s.as_str()).unwrap_or_default()
    }

    /// The enclosing area, if this is not a top-level name.
    pub fn parent(&self) -> Option<AreaName> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append a segment, producing a direct sub-name.
    pub fn child(&self, segment: &str) -> Result<AreaName, NameError> {
        if !valid_segment(segment) {
            return Err(NameError::Malformed {
                input: format!("{self}.{segment}"),
                reason: format!("invalid segment '{segment}'"),
            });
        }
        let mut segments = self.segments.clone();
        segments.push(CompactString::new(segment));
        Ok(Self { segments })
    }

    /// True iff `other` is a strict prefix of this name.
    pub fn is_sub_name_of(&self, other: &AreaName) -> bool {
        self.segments.len() > other.segments.len() && self.segments.starts_with(&other.segments)
    }

    /// True iff this name is exactly one level below `other`.
    pub fn is_direct_sub_name_of(&self, other: &AreaName) -> bool {
        self.segments.len() == other.segments.len() + 1 && self.is_sub_name_of(other)
    }
}

impl fmt::Display for AreaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEGMENT_SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for AreaName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AreaName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AreaName> for String {
    fn from(name: AreaName) -> Self {
        name.to_string()
    }
}

/// An area name plus an optional qualifier distinguishing renderings.
///
/// Ordered by area name, then unqualified before qualified, then by
/// qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QualifiedName {
    name: AreaName,
    qualifier: Option<CompactString>,
}

impl QualifiedName {
    /// Unqualified name for an area.
    pub fn new(name: AreaName) -> Self {
        Self {
            name,
            qualifier: None,
        }
    }

    /// Qualified variant of an area.
    pub fn with_qualifier(name: AreaName, qualifier: &str) -> Result<Self, NameError> {
        if qualifier.is_empty()
            || qualifier.contains(SEGMENT_SEPARATOR)
            || qualifier.contains(QUALIFIER_SEPARATOR)
        {
            return Err(NameError::Malformed {
                input: format!("{name}{QUALIFIER_SEPARATOR}{qualifier}"),
                reason: format!("invalid qualifier '{qualifier}'"),
            });
        }
        Ok(Self {
            name,
            qualifier: Some(CompactString::new(qualifier)),
        })
    }

    /// Parse `name` or `name-qualifier`.
    pub fn parse(text: &str) -> Result<Self, NameError> {
        match text.split_once(QUALIFIER_SEPARATOR) {
            Some((name, qualifier)) => Self::with_qualifier(AreaName::parse(name)?, qualifier),
            None => Ok(Self::new(AreaName::parse(text)?)),
        }
    }

    /// Resolve an artifact file path (`root.sub-hires.mr`) to its name.
    pub fn from_path(path: &Path) -> Result<Self, NameError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| NameError::UnknownArtifact {
                path: path.to_path_buf(),
            })?;
        let (stem, _) = ArtifactKind::split_file_name(file_name).ok_or_else(|| {
            NameError::UnknownArtifact {
                path: path.to_path_buf(),
            }
        })?;
        Self::parse(stem)
    }

    /// The logical area name, without qualifier.
    pub fn area_name(&self) -> &AreaName {
        &self.name
    }

    /// The qualifier, if any.
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Whether this names a specific rendering variant.
    pub fn is_qualified(&self) -> bool {
        self.qualifier.is_some()
    }

    /// True iff the area of this name lies strictly below `other`.
    pub fn is_sub_name_of(&self, other: &AreaName) -> bool {
        self.name.is_sub_name_of(other)
    }

    /// Whether both names refer to renderings of the same area.
    pub fn is_variant_of(&self, other: &QualifiedName) -> bool {
        self.name == other.name && self.qualifier != other.qualifier
    }
}

impl From<AreaName> for QualifiedName {
    fn from(name: AreaName) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}{QUALIFIER_SEPARATOR}{q}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl FromStr for QualifiedName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> Self {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> AreaName {
        AreaName::parse(s).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let n = name("root.sub.subsub");
        assert_eq!(n.depth(), 3);
        assert_eq!(n.to_string(), "root.sub.subsub");
        assert_eq!(n.last_segment(), "subsub");
    }

    #[test]
    fn test_malformed_names() {
        assert!(AreaName::parse("").is_err());
        assert!(AreaName::parse("root..sub").is_err());
        assert!(AreaName::parse("root.").is_err());
        assert!(AreaName::parse("ro ot").is_err());
        assert!(QualifiedName::parse("root-").is_err());
        assert!(QualifiedName::parse("root-a-b").is_err());
    }

    #[test]
    fn test_sub_name_is_strict() {
        let root = name("root");
        let sub = name("root.sub");
        assert!(sub.is_sub_name_of(&root));
        assert!(!root.is_sub_name_of(&root));
        assert!(!root.is_sub_name_of(&sub));
        assert!(!name("rootx.sub").is_sub_name_of(&root));
        assert!(name("root.sub.deep").is_sub_name_of(&root));
        assert!(!name("root.sub.deep").is_direct_sub_name_of(&root));
    }

    #[test]
    fn test_parent_and_child() {
        let n = name("root.sub");
        assert_eq!(n.parent(), Some(name("root")));
        assert_eq!(name("root").parent(), None);
        assert_eq!(n.child("x").unwrap(), name("root.sub.x"));
        assert!(n.child("x.y").is_err());
    }

    #[test]
    fn test_qualified_ordering_prefers_unqualified() {
        let plain = QualifiedName::parse("root.a").unwrap();
        let hires = QualifiedName::parse("root.a-hires").unwrap();
        let alt = QualifiedName::parse("root.a-alt").unwrap();
        let mut all = vec![hires.clone(), plain.clone(), alt.clone()];
        all.sort();
        assert_eq!(all, vec![plain.clone(), alt, hires.clone()]);
        assert!(hires.is_variant_of(&plain));
        assert_eq!(hires.area_name(), plain.area_name());
    }

    #[test]
    fn test_from_path() {
        let qn = QualifiedName::from_path(Path::new("/db/root.sub-hires.mr")).unwrap();
        assert_eq!(qn.area_name(), &name("root.sub"));
        assert_eq!(qn.qualifier(), Some("hires"));

        let plain = QualifiedName::from_path(Path::new("root.sub.md")).unwrap();
        assert!(!plain.is_qualified());

        assert!(matches!(
            QualifiedName::from_path(Path::new("notes.txt")),
            Err(NameError::UnknownArtifact { .. })
        ));
    }
}
