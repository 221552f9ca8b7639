//! Per-key value set: an open-chained hash table over arena nodes plus the
//! intra-set insertion-order list.
//!
//! The table stores bucket heads only; chains run through the nodes'
//! `next_in_bucket` links. Load factor is fixed at 1.0: the table doubles
//! once `len` exceeds the bucket count, capped at [`MAX_TABLE_SIZE`], and
//! never shrinks. Rehashing walks the insertion-order list and rebuilds the
//! chains without touching the list links, so every ordering survives a
//! resize untouched.

use crate::arena::{EntryId, Node};
use core::borrow::Borrow;
use slotmap::SlotMap;

/// Hard cap on the bucket count of one value set.
pub(crate) const MAX_TABLE_SIZE: usize = 1 << 30;

/// Smallest table any set starts with.
const MIN_TABLE_SIZE: usize = 2;

/// Rounds an expected-values hint up to the initial bucket count.
fn initial_table_size(expected_values: usize) -> usize {
    expected_values
        .max(MIN_TABLE_SIZE)
        .checked_next_power_of_two()
        .unwrap_or(MAX_TABLE_SIZE)
        .min(MAX_TABLE_SIZE)
}

#[derive(Debug)]
pub(crate) struct ValueSet {
    table: Vec<Option<EntryId>>,
    len: usize,
    /// Bumped on every structural change; cursors compare against it.
    mod_count: u64,
    first: Option<EntryId>,
    last: Option<EntryId>,
}

impl ValueSet {
    pub(crate) fn with_expected(expected_values: usize) -> Self {
        Self {
            table: vec![None; initial_table_size(expected_values)],
            len: 0,
            mod_count: 0,
            first: None,
            last: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn mod_count(&self) -> u64 {
        self.mod_count
    }

    pub(crate) fn first(&self) -> Option<EntryId> {
        self.first
    }

    #[cfg(test)]
    pub(crate) fn table_len(&self) -> usize {
        self.table.len()
    }

    fn bucket(&self, hash: u64) -> usize {
        // Table length is always a power of two.
        (hash as usize) & (self.table.len() - 1)
    }

    /// Looks up a structurally equal value, cheapest check first: the
    /// cached hash, then `Eq`.
    pub(crate) fn find<V, Q>(
        &self,
        slots: &SlotMap<EntryId, Node<V>>,
        hash: u64,
        value: &Q,
    ) -> Option<EntryId>
    where
        V: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut cur = self.table[self.bucket(hash)];
        while let Some(id) = cur {
            let node = &slots[id];
            if node.hash == hash && node.value().borrow() == value {
                return Some(id);
            }
            cur = node.next_in_bucket;
        }
        None
    }

    /// Links an already-allocated node: prepends it to its bucket chain and
    /// appends it to the insertion-order list, then resizes if needed. The
    /// caller has ruled out duplicates.
    pub(crate) fn link<V>(&mut self, slots: &mut SlotMap<EntryId, Node<V>>, id: EntryId, hash: u64) {
        let b = self.bucket(hash);
        slots[id].next_in_bucket = self.table[b];
        self.table[b] = Some(id);

        slots[id].pred_in_set = self.last;
        match self.last {
            Some(prev) => slots[prev].succ_in_set = Some(id),
            None => self.first = Some(id),
        }
        self.last = Some(id);

        self.len += 1;
        self.mod_count += 1;
        self.rehash_if_necessary(slots);
    }

    /// Removes the node holding a structurally equal value, unlinking it
    /// from the bucket chain and the insertion-order list. Returns the
    /// unlinked id; the caller still owns the arena slot and the global
    /// list links.
    pub(crate) fn unlink_value<V, Q>(
        &mut self,
        slots: &mut SlotMap<EntryId, Node<V>>,
        hash: u64,
        value: &Q,
    ) -> Option<EntryId>
    where
        V: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let b = self.bucket(hash);
        let mut prev: Option<EntryId> = None;
        let mut cur = self.table[b];
        while let Some(id) = cur {
            let node = &slots[id];
            if node.hash == hash && node.value().borrow() == value {
                self.splice_bucket(slots, b, prev, id);
                self.unlink_from_list(slots, id);
                self.len -= 1;
                self.mod_count += 1;
                return Some(id);
            }
            prev = cur;
            cur = node.next_in_bucket;
        }
        None
    }

    /// Removes a node known by id (cursor removal). The bucket chain is
    /// scanned by identity using the node's cached hash.
    pub(crate) fn unlink_entry<V>(&mut self, slots: &mut SlotMap<EntryId, Node<V>>, id: EntryId) {
        let b = self.bucket(slots[id].hash);
        let mut prev: Option<EntryId> = None;
        let mut cur = self.table[b];
        while let Some(cid) = cur {
            if cid == id {
                self.splice_bucket(slots, b, prev, id);
                self.unlink_from_list(slots, id);
                self.len -= 1;
                self.mod_count += 1;
                return;
            }
            prev = cur;
            cur = slots[cid].next_in_bucket;
        }
        unreachable!("node absent from its own bucket chain");
    }

    fn splice_bucket<V>(
        &mut self,
        slots: &mut SlotMap<EntryId, Node<V>>,
        bucket: usize,
        prev: Option<EntryId>,
        id: EntryId,
    ) {
        let next = slots[id].next_in_bucket;
        match prev {
            Some(p) => slots[p].next_in_bucket = next,
            None => self.table[bucket] = next,
        }
    }

    fn unlink_from_list<V>(&mut self, slots: &mut SlotMap<EntryId, Node<V>>, id: EntryId) {
        let pred = slots[id].pred_in_set;
        let succ = slots[id].succ_in_set;
        match pred {
            Some(p) => slots[p].succ_in_set = succ,
            None => self.first = succ,
        }
        match succ {
            Some(s) => slots[s].pred_in_set = pred,
            None => self.last = pred,
        }
    }

    /// Empties the set in place, keeping the current table capacity. Nodes
    /// are not freed here; the caller walks the list first.
    pub(crate) fn reset(&mut self) {
        for head in &mut self.table {
            *head = None;
        }
        self.len = 0;
        self.first = None;
        self.last = None;
        self.mod_count += 1;
    }

    fn rehash_if_necessary<V>(&mut self, slots: &mut SlotMap<EntryId, Node<V>>) {
        if self.len <= self.table.len() || self.table.len() >= MAX_TABLE_SIZE {
            return;
        }
        let new_len = self.table.len() * 2;
        self.table.clear();
        self.table.resize(new_len, None);
        let mask = new_len - 1;
        let mut cur = self.first;
        while let Some(id) = cur {
            let b = (slots[id].hash as usize) & mask;
            slots[id].next_in_bucket = self.table[b];
            self.table[b] = Some(id);
            cur = slots[id].succ_in_set;
        }
    }
}
