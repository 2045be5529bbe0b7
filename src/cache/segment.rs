//! Segment Module
//!
//! One generation of cache entries: a bounded, insertion-ordered key-value
//! map. Only the owning cache can write to a segment, so once a segment is
//! detached it is read-only to whoever receives it.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

// == Segment ==
/// Insertion-ordered key-value map with O(1) keyed lookup.
#[derive(Debug, Clone)]
pub struct Segment<K, V> {
    /// Entries in insertion order
    entries: Vec<(K, V)>,
    /// Key to position in `entries`
    index: HashMap<K, usize>,
}

impl<K, V> Segment<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    // == Insert ==
    /// Inserts or replaces `key`. Returns the previous value if the key was
    /// already present; a replaced entry keeps its original position.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&position) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[position].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = *self.index.get(key)?;
        Some(&mut self.entries[position].1)
    }

    // == Lookup ==
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = *self.index.get(key)?;
        Some(&self.entries[position].1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }
}

impl<K, V> Segment<K, V> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.iter().map(|(key, _)| key)
    }
}

impl<K, V> IntoIterator for Segment<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    /// Consumes the segment, yielding entries in insertion order.
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
