//! OrderedSetMultimap: the multimap core tying the key index, the per-key
//! value sets, and the global insertion-order list together.

use crate::arena::{EntryId, KeyId, Node};
use crate::cursor::{EntryCursor, SetCursor};
use crate::guard::ReentryCheck;
use crate::iter::{Groups, Iter, Keys, SetValues, Values};
use crate::value_set::ValueSet;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_table::{Entry as TableEntry, HashTable};
use slotmap::SlotMap;
use std::collections::hash_map::RandomState;

pub(crate) const DEFAULT_KEY_CAPACITY: usize = 16;
pub(crate) const DEFAULT_VALUES_PER_KEY: usize = 2;

/// One slot per distinct live key: the key itself, its cached hash, its
/// value set, and the doubly linked key-insertion-order links.
#[derive(Debug)]
pub(crate) struct KeySlot<K> {
    pub(crate) key: K,
    pub(crate) hash: u64,
    pub(crate) set: ValueSet,
    pub(crate) pred: Option<KeyId>,
    pub(crate) succ: Option<KeyId>,
}

/// A multimap that rejects duplicate (key, value) pairs and iterates in
/// insertion order three ways at once.
///
/// - [`keys`](Self::keys) and [`groups`](Self::groups) follow the order
///   keys were *first* inserted. Removing every value of a key drops the
///   key from that order; adding it back later places it last.
/// - [`get`](Self::get) follows the order values were inserted under that
///   key.
/// - [`iter`](Self::iter) and [`values`](Self::values) follow the single
///   chronological order of all successful insertions across keys.
///
/// Inserting a pair that is already present changes nothing and reports
/// `false`. The structure is single-threaded; it detects (in cursors) but
/// does not prevent interleaved structural modification.
pub struct OrderedSetMultimap<K, V, S = RandomState> {
    pub(crate) hasher: S,
    /// Hash index over key slots; equality resolves through `keys`.
    key_index: HashTable<KeyId>,
    pub(crate) keys: SlotMap<KeyId, KeySlot<K>>,
    pub(crate) slots: SlotMap<EntryId, Node<V>>,
    /// Sentinel arena slot bounding the circular global list.
    pub(crate) header: EntryId,
    pub(crate) first_key: Option<KeyId>,
    last_key: Option<KeyId>,
    len: usize,
    expected_values_per_key: usize,
    guard: ReentryCheck,
}

impl<K, V> OrderedSetMultimap<K, V> {
    /// Creates an empty multimap with default capacity hints.
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(
            DEFAULT_KEY_CAPACITY,
            DEFAULT_VALUES_PER_KEY,
            RandomState::default(),
        )
    }

    /// Creates an empty multimap sized for the expected number of distinct
    /// keys and the expected number of values per key.
    pub fn with_capacity(expected_keys: usize, expected_values_per_key: usize) -> Self {
        Self::with_capacity_and_hasher(
            expected_keys,
            expected_values_per_key,
            RandomState::default(),
        )
    }
}

impl<K, V> Default for OrderedSetMultimap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> OrderedSetMultimap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_KEY_CAPACITY, DEFAULT_VALUES_PER_KEY, hasher)
    }

    pub fn with_capacity_and_hasher(
        expected_keys: usize,
        expected_values_per_key: usize,
        hasher: S,
    ) -> Self {
        let mut slots = SlotMap::with_key();
        let header = alloc_header(&mut slots);
        Self {
            hasher,
            key_index: HashTable::with_capacity(expected_keys),
            keys: SlotMap::with_capacity_and_key(expected_keys),
            slots,
            header,
            first_key: None,
            last_key: None,
            len: 0,
            expected_values_per_key,
            guard: ReentryCheck::new(),
        }
    }

    /// Returns a reference to the multimap's [`BuildHasher`].
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Number of (key, value) pairs.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct keys with at least one value.
    pub fn keys_len(&self) -> usize {
        self.keys.len()
    }

    /// Iterates all pairs in global insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.keys, &self.slots, self.header, self.len)
    }

    /// Iterates all values in global insertion order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    /// Iterates keys in first-insertion order.
    pub fn keys(&self) -> Keys<'_, K> {
        Keys::new(&self.keys, self.first_key)
    }

    /// Iterates `(key, values-view)` groups in key order; the asMap-style
    /// view.
    pub fn groups(&self) -> Groups<'_, K, V, S> {
        Groups::new(self)
    }

    /// Detached cursor over the global entry order. Cursor methods take the
    /// multimap on every call, so removal through the cursor and detection
    /// of outside interference both work.
    pub fn entry_cursor(&self) -> EntryCursor {
        EntryCursor::new(self.slots[self.header].succ_global)
    }

    /// Removes everything. Allocated capacity is retained.
    pub fn clear(&mut self) {
        {
            let _g = self.guard.enter();
            self.key_index.clear();
            self.first_key = None;
            self.last_key = None;
            self.len = 0;
        }
        // Clearing the arenas in place bumps every slot's version, so ids
        // held by detached cursors go stale instead of aliasing entries
        // inserted after the clear. Key and value drops run here, after
        // the guard is released.
        self.keys.clear();
        self.slots.clear();
        self.header = alloc_header(&mut self.slots);
    }
}

impl<K, V, S> OrderedSetMultimap<K, V, S>
where
    K: Hash + Eq,
    V: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts a pair. Returns `false`, changing nothing, if the exact
    /// (key, value) pair is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let rejected;
        let dup_key;
        {
            let _g = self.guard.enter();
            let (key_id, dup) = self.ensure_key(key);
            dup_key = dup;
            let hash = self.hasher.hash_one(&value);
            rejected = self.insert_at(key_id, hash, value);
        }
        // A redundant key and a rejected value drop here, outside the
        // guarded section.
        drop(dup_key);
        rejected.is_none()
    }

    /// Removes one pair by borrowed key and value. Returns `false` if the
    /// pair was not present.
    pub fn remove<KQ, VQ>(&mut self, key: &KQ, value: &VQ) -> bool
    where
        K: Borrow<KQ>,
        KQ: Hash + Eq + ?Sized,
        V: Borrow<VQ>,
        VQ: Hash + Eq + ?Sized,
    {
        let removed: Option<Node<V>>;
        let mut released = None;
        {
            let _g = self.guard.enter();
            removed = match self.find_key(key) {
                Some(key_id) => {
                    let hash = self.hasher.hash_one(value);
                    match self.keys[key_id]
                        .set
                        .unlink_value(&mut self.slots, hash, value)
                    {
                        Some(id) => {
                            let node = self.unlink_global(id);
                            self.len -= 1;
                            if self.keys[key_id].set.is_empty() {
                                released = Some(self.release_key(key_id));
                            }
                            Some(node)
                        }
                        None => None,
                    }
                }
                None => None,
            };
        }
        // Key and value drops run here, outside the guarded section.
        drop(released);
        removed.is_some()
    }

    pub fn contains<KQ, VQ>(&self, key: &KQ, value: &VQ) -> bool
    where
        K: Borrow<KQ>,
        KQ: Hash + Eq + ?Sized,
        V: Borrow<VQ>,
        VQ: Hash + Eq + ?Sized,
    {
        let _g = self.guard.enter();
        match self.find_key(key) {
            Some(key_id) => {
                let hash = self.hasher.hash_one(value);
                self.keys[key_id].set.find(&self.slots, hash, value).is_some()
            }
            None => false,
        }
    }

    pub fn contains_key<KQ>(&self, key: &KQ) -> bool
    where
        K: Borrow<KQ>,
        KQ: Hash + Eq + ?Sized,
    {
        let _g = self.guard.enter();
        self.find_key(key).is_some()
    }

    /// Borrowing view over one key's values in value-insertion order.
    /// The view of an absent key is empty.
    pub fn get<'a, KQ>(&'a self, key: &KQ) -> SetValues<'a, K, V, S>
    where
        K: Borrow<KQ>,
        KQ: Hash + Eq + ?Sized,
    {
        let key_id = {
            let _g = self.guard.enter();
            self.find_key(key)
        };
        SetValues::new(self, key_id)
    }

    /// Detached cursor over one key's values; supports removal through the
    /// cursor and fails fast when the set is modified around it.
    pub fn set_cursor<KQ>(&self, key: &KQ) -> SetCursor
    where
        K: Borrow<KQ>,
        KQ: Hash + Eq + ?Sized,
    {
        let _g = self.guard.enter();
        match self.find_key(key) {
            Some(key_id) => {
                let set = &self.keys[key_id].set;
                SetCursor::new(Some(key_id), set.first(), set.mod_count())
            }
            None => SetCursor::new(None, None, 0),
        }
    }

    /// Removes a key and all its values, returning them in value-insertion
    /// order. Empty if the key was absent.
    pub fn remove_all<KQ>(&mut self, key: &KQ) -> Vec<V>
    where
        K: Borrow<KQ>,
        KQ: Hash + Eq + ?Sized,
    {
        let values;
        let mut released = None;
        {
            let _g = self.guard.enter();
            values = match self.find_key(key) {
                Some(key_id) => {
                    let out = self.drain_set(key_id);
                    released = Some(self.release_key(key_id));
                    out
                }
                None => Vec::new(),
            };
        }
        drop(released);
        values
    }

    /// Replaces a key's values with the given sequence (deduplicated, in
    /// iteration order), returning the old values. An existing key keeps
    /// its position in key order; the new values still come last in global
    /// order. Replacing with an empty sequence removes the key.
    pub fn replace_values<I>(&mut self, key: K, values: I) -> Vec<V>
    where
        I: IntoIterator<Item = V>,
    {
        let old;
        let dup_key;
        let mut released = None;
        let mut rejected = Vec::new();
        {
            let _g = self.guard.enter();
            let (key_id, dup) = self.ensure_key(key);
            dup_key = dup;
            old = self.drain_set(key_id);
            for value in values {
                let hash = self.hasher.hash_one(&value);
                if let Some(value) = self.insert_at(key_id, hash, value) {
                    rejected.push(value);
                }
            }
            if self.keys[key_id].set.is_empty() {
                released = Some(self.release_key(key_id));
            }
        }
        // Redundant inputs and the released key slot drop here, outside
        // the guarded section.
        drop(dup_key);
        drop(rejected);
        drop(released);
        old
    }

    /// Finds the slot of a live key, or creates one at the tail of the key
    /// order. The index entry is keyed by the cached hash; equality is
    /// resolved through the slot arena. On a hit the redundant key comes
    /// back with the id so the caller can drop it outside the guarded
    /// section.
    fn ensure_key(&mut self, key: K) -> (KeyId, Option<K>) {
        let hash = self.hasher.hash_one(&key);
        match self.key_index.entry(
            hash,
            |&id| self.keys.get(id).map(|s| s.key == key).unwrap_or(false),
            |&id| self.keys.get(id).map(|s| s.hash).unwrap_or(0),
        ) {
            TableEntry::Occupied(o) => (*o.get(), Some(key)),
            TableEntry::Vacant(v) => {
                let id = self.keys.insert(KeySlot {
                    key,
                    hash,
                    set: ValueSet::with_expected(self.expected_values_per_key),
                    pred: self.last_key,
                    succ: None,
                });
                match self.last_key {
                    Some(prev) => self.keys[prev].succ = Some(id),
                    None => self.first_key = Some(id),
                }
                self.last_key = Some(id);
                v.insert(id);
                (id, None)
            }
        }
    }

    pub(crate) fn find_key<KQ>(&self, key: &KQ) -> Option<KeyId>
    where
        K: Borrow<KQ>,
        KQ: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);
        self.key_index
            .find(hash, |&id| {
                self.keys
                    .get(id)
                    .map(|s| s.key.borrow() == key)
                    .unwrap_or(false)
            })
            .copied()
    }

    /// Allocates and fully links a node, or hands the value back untouched
    /// when the pair already exists. Linking is all-or-nothing: a rejected
    /// value leaves no trace, not even a modification-counter bump.
    fn insert_at(&mut self, key_id: KeyId, hash: u64, value: V) -> Option<V> {
        if self.keys[key_id]
            .set
            .find(&self.slots, hash, &value)
            .is_some()
        {
            return Some(value);
        }
        let tail = self.slots[self.header].pred_global;
        let id = self.slots.insert(Node {
            key: key_id,
            value: Some(value),
            hash,
            pred_global: tail,
            succ_global: self.header,
            pred_in_set: None,
            succ_in_set: None,
            next_in_bucket: None,
        });
        self.slots[tail].succ_global = id;
        self.slots[self.header].pred_global = id;
        self.keys[key_id].set.link(&mut self.slots, id, hash);
        self.len += 1;
        None
    }
}

impl<K, V, S> OrderedSetMultimap<K, V, S> {
    pub(crate) fn dec_len(&mut self) {
        self.len -= 1;
    }

    /// Splices a node out of the circular global list and frees its arena
    /// slot. The per-set unlinking has already happened.
    pub(crate) fn unlink_global(&mut self, id: EntryId) -> Node<V> {
        let node = self.slots.remove(id).unwrap();
        self.slots[node.pred_global].succ_global = node.succ_global;
        self.slots[node.succ_global].pred_global = node.pred_global;
        node
    }

    /// Frees every node of one key's set, returning the values in set
    /// order. The set is reset in place; the key slot survives.
    pub(crate) fn drain_set(&mut self, key_id: KeyId) -> Vec<V> {
        let mut ids = Vec::new();
        let mut cur = self.keys[key_id].set.first();
        while let Some(id) = cur {
            cur = self.slots[id].succ_in_set;
            ids.push(id);
        }
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let node = self.unlink_global(id);
            out.push(node.into_value());
            self.len -= 1;
        }
        self.keys[key_id].set.reset();
        out
    }

    /// Drops an emptied key from the index and the key order. Returns the
    /// slot so the caller can control when `K` drops.
    pub(crate) fn release_key(&mut self, key_id: KeyId) -> KeySlot<K> {
        let slot = self.keys.remove(key_id).unwrap();
        if let Ok(occupied) = self.key_index.find_entry(slot.hash, |&id| id == key_id) {
            occupied.remove();
        }
        match slot.pred {
            Some(p) => self.keys[p].succ = slot.succ,
            None => self.first_key = slot.succ,
        }
        match slot.succ {
            Some(s) => self.keys[s].pred = slot.pred,
            None => self.last_key = slot.pred,
        }
        slot
    }
}

fn alloc_header<V>(slots: &mut SlotMap<EntryId, Node<V>>) -> EntryId {
    slots.insert_with_key(|id| Node {
        key: KeyId::default(),
        value: None,
        hash: 0,
        pred_global: id,
        succ_global: id,
        pred_in_set: None,
        succ_in_set: None,
        next_in_bucket: None,
    })
}

impl<'a, K, V, S> IntoIterator for &'a OrderedSetMultimap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> Extend<(K, V)> for OrderedSetMultimap<K, V, S>
where
    K: Hash + Eq,
    V: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for OrderedSetMultimap<K, V, S>
where
    K: Hash + Eq,
    V: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Builds a multimap from pairs, deduplicating and keeping the first
    /// occurrence of each pair in place.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut map =
            Self::with_capacity_and_hasher(iter.size_hint().0, DEFAULT_VALUES_PER_KEY, S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> PartialEq for OrderedSetMultimap<K, V, S>
where
    K: Hash + Eq,
    V: Hash + Eq,
    S: BuildHasher,
{
    /// Key-to-value-set equality, ignoring every insertion order.
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len || self.keys_len() != other.keys_len() {
            return false;
        }
        self.groups().all(|(key, values)| {
            let theirs = other.get(key);
            theirs.len() == values.len() && values.iter().all(|v| theirs.contains(v))
        })
    }
}

impl<K, V, S> Eq for OrderedSetMultimap<K, V, S>
where
    K: Hash + Eq,
    V: Hash + Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Clone for OrderedSetMultimap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        let mut out = Self::with_capacity_and_hasher(
            self.keys_len(),
            self.expected_values_per_key,
            self.hasher.clone(),
        );
        for (key, value) in self.iter() {
            out.insert(key.clone(), value.clone());
        }
        out
    }
}

impl<K, V, S> fmt::Debug for OrderedSetMultimap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.groups()).finish()
    }
}
