//! Borrowing iterators and views.
//!
//! Everything here holds a shared borrow of the multimap, so the borrow
//! checker rules out structural modification for the iterator's lifetime;
//! the fail-fast modification counters only matter for the detached
//! cursors in `cursor`.

use crate::arena::{EntryId, KeyId, Node};
use crate::multimap::{KeySlot, OrderedSetMultimap};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use slotmap::SlotMap;

/// Iterator over all (key, value) pairs in global insertion order.
pub struct Iter<'a, K, V> {
    keys: &'a SlotMap<KeyId, KeySlot<K>>,
    slots: &'a SlotMap<EntryId, Node<V>>,
    header: EntryId,
    next: EntryId,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(
        keys: &'a SlotMap<KeyId, KeySlot<K>>,
        slots: &'a SlotMap<EntryId, Node<V>>,
        header: EntryId,
        remaining: usize,
    ) -> Self {
        let next = slots[header].succ_global;
        Self {
            keys,
            slots,
            header,
            next,
            remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == self.header {
            return None;
        }
        let node = &self.slots[self.next];
        self.next = node.succ_global;
        self.remaining -= 1;
        Some((&self.keys[node.key].key, node.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over all values in global insertion order.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Iterator over keys in first-insertion order.
pub struct Keys<'a, K> {
    keys: &'a SlotMap<KeyId, KeySlot<K>>,
    next: Option<KeyId>,
}

impl<'a, K> Keys<'a, K> {
    pub(crate) fn new(keys: &'a SlotMap<KeyId, KeySlot<K>>, first: Option<KeyId>) -> Self {
        Self { keys, next: first }
    }
}

impl<'a, K> Iterator for Keys<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let slot = &self.keys[id];
        self.next = slot.succ;
        Some(&slot.key)
    }
}

impl<K> FusedIterator for Keys<'_, K> {}

/// Live view over one key's values, in value-insertion order.
pub struct SetValues<'a, K, V, S> {
    map: &'a OrderedSetMultimap<K, V, S>,
    key: Option<KeyId>,
}

impl<'a, K, V, S> SetValues<'a, K, V, S> {
    pub(crate) fn new(map: &'a OrderedSetMultimap<K, V, S>, key: Option<KeyId>) -> Self {
        Self { map, key }
    }

    fn set(&self) -> Option<&'a crate::value_set::ValueSet> {
        self.key.map(|id| &self.map.keys[id].set)
    }

    pub fn len(&self) -> usize {
        self.set().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> SetValuesIter<'a, V> {
        SetValuesIter {
            slots: &self.map.slots,
            next: self.set().and_then(|s| s.first()),
        }
    }
}

impl<'a, K, V, S> SetValues<'a, K, V, S>
where
    V: Hash + Eq,
    S: BuildHasher,
{
    pub fn contains<VQ>(&self, value: &VQ) -> bool
    where
        V: Borrow<VQ>,
        VQ: Hash + Eq + ?Sized,
    {
        match self.set() {
            Some(set) => {
                let hash = self.map.hasher.hash_one(value);
                set.find(&self.map.slots, hash, value).is_some()
            }
            None => false,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &SetValues<'a, K, V, S> {
    type Item = &'a V;
    type IntoIter = SetValuesIter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> fmt::Debug for SetValues<'_, K, V, S>
where
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Iterator over one key's values.
pub struct SetValuesIter<'a, V> {
    slots: &'a SlotMap<EntryId, Node<V>>,
    next: Option<EntryId>,
}

impl<'a, V> Iterator for SetValuesIter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = &self.slots[id];
        self.next = node.succ_in_set;
        Some(node.value())
    }
}

impl<V> FusedIterator for SetValuesIter<'_, V> {}

/// Iterator over `(key, values-view)` groups in key order.
pub struct Groups<'a, K, V, S> {
    map: &'a OrderedSetMultimap<K, V, S>,
    next: Option<KeyId>,
}

impl<'a, K, V, S> Groups<'a, K, V, S> {
    pub(crate) fn new(map: &'a OrderedSetMultimap<K, V, S>) -> Self {
        Self {
            map,
            next: map.first_key,
        }
    }
}

impl<'a, K, V, S> Iterator for Groups<'a, K, V, S> {
    type Item = (&'a K, SetValues<'a, K, V, S>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let slot = &self.map.keys[id];
        self.next = slot.succ;
        Some((&slot.key, SetValues::new(self.map, Some(id))))
    }
}

impl<K, V, S> FusedIterator for Groups<'_, K, V, S> {}
