//! Ordered, duplicate-free name sequence.

use indexmap::IndexSet;

use fractaldb_core::QualifiedName;

/// Iterator over list entries in order.
pub type Iter<'a> = indexmap::set::Iter<'a, QualifiedName>;

/// Insertion-ordered set of qualified names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniqueList {
    names: IndexSet<QualifiedName>,
}

impl UniqueList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a name; returns `false` if it was already present.
    pub fn insert(&mut self, name: QualifiedName) -> bool {
        self.names.insert(name)
    }

    /// Remove a name, keeping the order of the remaining entries.
    pub fn remove(&mut self, name: &QualifiedName) -> bool {
        self.names.shift_remove(name)
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.names.contains(name)
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entry at a position.
    pub fn get(&self, index: usize) -> Option<&QualifiedName> {
        self.names.get_index(index)
    }

    pub fn iter(&self) -> Iter<'_> {
        self.names.iter()
    }

    pub fn to_vec(&self) -> Vec<QualifiedName> {
        self.names.iter().cloned().collect()
    }
}

impl FromIterator<QualifiedName> for UniqueList {
    fn from_iter<I: IntoIterator<Item = QualifiedName>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

impl Extend<QualifiedName> for UniqueList {
    fn extend<I: IntoIterator<Item = QualifiedName>>(&mut self, iter: I) {
        self.names.extend(iter);
    }
}

impl<'a> IntoIterator for &'a UniqueList {
    type Item = &'a QualifiedName;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}
