use indexmap::map::{Iter, Keys};
use indexmap::IndexMap;

/**
An ordered mapping from a record's native ID to its flat position in a list.

A wrapper around [`indexmap::IndexMap`]. When the same ID is inserted twice the later
position replaces the earlier one, while the key keeps its first insertion slot.
*/
#[derive(Default, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdIndex {
    /// The name of the index, usually the kind of record it covers
    pub name: String,

    #[cfg_attr(feature = "serde", serde(with = "indexmap::map::serde_seq"))]
    pub positions: IndexMap<Box<str>, usize>,
}

impl IdIndex {
    pub fn new(name: String) -> IdIndex {
        IdIndex {
            name,
            ..Default::default()
        }
    }

    pub fn with_capacity(name: String, capacity: usize) -> IdIndex {
        IdIndex {
            name,
            positions: IndexMap::with_capacity(capacity),
        }
    }

    /// Get the flat position of the specified ID
    #[inline]
    pub fn get(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Insert `key` at `position`, returning the position it replaced
    #[inline]
    pub fn insert<T: Into<Box<str>>>(&mut self, key: T, position: usize) -> Option<usize> {
        self.positions.insert(key.into(), position)
    }

    /// The number of distinct IDs, which is less than the number of records
    /// when IDs collide
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn keys(&self) -> Keys<'_, Box<str>, usize> {
        self.positions.keys()
    }

    pub fn iter(&self) -> Iter<'_, Box<str>, usize> {
        self.positions.iter()
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }
}

/// The immutable product of a list's one-time index build: the entries in flat index
/// order and the reverse map from ID to position
#[derive(Debug, Clone)]
pub(crate) struct ListIndex<E> {
    pub entries: Vec<E>,
    pub ids: IdIndex,
}

impl<E> ListIndex<E> {
    pub fn new(name: &str, capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            ids: IdIndex::with_capacity(name.to_string(), capacity),
        }
    }

    /// Append an entry, assigning it the next flat index. `make_entry` receives that index.
    pub fn push(&mut self, id: String, make_entry: impl FnOnce(usize, String) -> E) -> usize {
        let index = self.entries.len();
        if self.ids.insert(id.as_str(), index).is_some() {
            log::debug!("Duplicate {} ID {id}, the later record shadows it", self.ids.name);
        }
        self.entries.push(make_entry(index, id));
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&E> {
        self.entries.get(index)
    }

    /// The flat index of `id`, or the list length when it is absent
    pub fn find(&self, id: &str) -> usize {
        self.ids.get(id).unwrap_or(self.entries.len())
    }
}
