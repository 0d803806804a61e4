//! Insertion-ordered key/value container backing the `LIST_MAP` field variant.
//!
//! Keys keep their original position across overwrites: `put` on an existing
//! key updates the value in place, `remove` closes the gap. Alongside key
//! lookup, entries can be addressed positionally, which is what lets a field
//! path like `/row/2` resolve against a header-less delimited record.

use super::field::Field;
use indexmap::IndexMap;
use std::fmt;

/// An insertion-ordered string-to-[`Field`] map with O(1) membership and
/// O(1) append.
#[derive(Debug, Clone, Default)]
pub struct OrderedMap {
    entries: IndexMap<String, Field>,
}

impl OrderedMap {
    /// Create an empty ordered map.
    pub fn new() -> Self {
        OrderedMap {
            entries: IndexMap::new(),
        }
    }

    /// Insert or update an entry. An existing key keeps its original position;
    /// a new key is appended at the end.
    pub fn put(&mut self, key: impl Into<String>, value: Field) -> Option<Field> {
        self.entries.insert(key.into(), value)
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.entries.get(key)
    }

    /// Look up a value by key, mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Field> {
        self.entries.get_mut(key)
    }

    /// Look up an entry by position.
    pub fn get_at(&self, index: usize) -> Option<(&String, &Field)> {
        self.entries.get_index(index)
    }

    /// Look up a value by position, mutably.
    pub fn get_at_mut(&mut self, index: usize) -> Option<&mut Field> {
        self.entries.get_index_mut(index).map(|(_, v)| v)
    }

    /// Remove an entry by key, preserving the relative order of the remaining
    /// entries.
    pub fn remove(&mut self, key: &str) -> Option<Field> {
        self.entries.shift_remove(key)
    }

    /// Whether the map contains the key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Field> {
        self.entries.values()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.entries.iter()
    }

    /// An explicit entry cursor over the map that can be restarted with
    /// [`OrderedMapEntries::reset`].
    pub fn entries(&self) -> OrderedMapEntries<'_> {
        OrderedMapEntries {
            map: self,
            position: 0,
        }
    }
}

/// A restartable cursor over an [`OrderedMap`].
pub struct OrderedMapEntries<'a> {
    map: &'a OrderedMap,
    position: usize,
}

impl<'a> OrderedMapEntries<'a> {
    /// Rewind the cursor to the first entry.
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

impl<'a> Iterator for OrderedMapEntries<'a> {
    type Item = (&'a String, &'a Field);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.map.get_at(self.position);
        if entry.is_some() {
            self.position += 1;
        }
        entry
    }
}

/// Equality is order-sensitive: two maps with the same entries in a different
/// order are not equal. This is what makes SDC-JSON round-trips exact.
impl PartialEq for OrderedMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl FromIterator<(String, Field)> for OrderedMap {
    fn from_iter<I: IntoIterator<Item = (String, Field)>>(iter: I) -> Self {
        OrderedMap {
            entries: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for OrderedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        write!(f, "}}")
    }
}
