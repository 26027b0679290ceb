//! Derived name lists for fractaldb.
//!
//! Every list here is a projection of a scanner index: it is recomputed on
//! [`DerivedList::refresh`] and never edits storage. The one exception is
//! the [`UnseenList`], whose removals are written back to the seen list.

mod derived;
mod store;
mod unique;
mod unseen;

pub use derived::{DerivedList, ListKind};
pub use store::{JsonFileStore, ListStore, MemoryStore};
pub use unique::{Iter, UniqueList};
pub use unseen::{SeenList, UnseenList};
