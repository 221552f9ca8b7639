//! Detached cursors: iteration that can interleave with mutation.
//!
//! A borrowing iterator can never observe a concurrent structural change,
//! the borrow checker forbids it. Cursors give up the borrow instead: they
//! hold arena ids plus a snapshot of the owning set's modification
//! counter, and take the multimap on every call. That re-admits the
//! interleaving the original design guards against, so the fail-fast
//! check comes back: a set cursor errors when its set was structurally
//! modified behind its back, an entry cursor errors when its resume point
//! no longer resolves in the arena (generational ids make stale slots
//! detectable rather than aliasable).

use crate::arena::{EntryId, KeyId};
use crate::multimap::OrderedSetMultimap;
use core::fmt;

/// Failure surfaced by a cursor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorError {
    /// The structure was modified between cursor calls by something other
    /// than this cursor.
    Desynced,
    /// `remove_current` without a preceding successful `next`, or twice
    /// for the same element.
    NoCurrent,
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorError::Desynced => f.write_str("multimap modified during cursor traversal"),
            CursorError::NoCurrent => f.write_str("cursor has no current element to remove"),
        }
    }
}

impl std::error::Error for CursorError {}

/// Cursor over one key's values in value-insertion order.
///
/// Created by [`OrderedSetMultimap::set_cursor`]. Exhaustion is `Ok(None)`;
/// a cursor built for an absent key is exhausted from the start.
pub struct SetCursor {
    /// `None` once there is no set left to walk (absent key, or the set
    /// was emptied through this cursor).
    key: Option<KeyId>,
    next: Option<EntryId>,
    current: Option<EntryId>,
    expected_mod: u64,
}

impl SetCursor {
    pub(crate) fn new(key: Option<KeyId>, next: Option<EntryId>, expected_mod: u64) -> Self {
        Self {
            key,
            next,
            current: None,
            expected_mod,
        }
    }

    /// Advances and returns the next value, or `Ok(None)` when exhausted.
    pub fn next<'a, K, V, S>(
        &mut self,
        map: &'a OrderedSetMultimap<K, V, S>,
    ) -> Result<Option<&'a V>, CursorError> {
        let Some(key_id) = self.key else {
            return Ok(None);
        };
        let slot = map.keys.get(key_id).ok_or(CursorError::Desynced)?;
        if slot.set.mod_count() != self.expected_mod {
            return Err(CursorError::Desynced);
        }
        let Some(id) = self.next else {
            return Ok(None);
        };
        let node = &map.slots[id];
        self.current = Some(id);
        self.next = node.succ_in_set;
        Ok(Some(node.value()))
    }

    /// Removes the element last returned by [`next`](Self::next) and hands
    /// it back. Re-syncs the cursor with the counter bump its own removal
    /// causes. Emptying the set this way removes the key from the multimap.
    pub fn remove_current<K, V, S>(
        &mut self,
        map: &mut OrderedSetMultimap<K, V, S>,
    ) -> Result<V, CursorError> {
        let Some(key_id) = self.key else {
            return Err(CursorError::NoCurrent);
        };
        let slot = map.keys.get_mut(key_id).ok_or(CursorError::Desynced)?;
        if slot.set.mod_count() != self.expected_mod {
            return Err(CursorError::Desynced);
        }
        let id = self.current.take().ok_or(CursorError::NoCurrent)?;
        slot.set.unlink_entry(&mut map.slots, id);
        let node = map.unlink_global(id);
        map.dec_len();
        if map.keys[key_id].set.is_empty() {
            let _slot = map.release_key(key_id);
            self.key = None;
            self.next = None;
        } else {
            self.expected_mod = map.keys[key_id].set.mod_count();
        }
        Ok(node.into_value())
    }
}

/// Cursor over all entries in global insertion order.
///
/// Created by [`OrderedSetMultimap::entry_cursor`]. The global list carries
/// no modification counter; staleness is detected generationally, when the
/// cursor's resume point or current element no longer resolves.
pub struct EntryCursor {
    next: EntryId,
    current: Option<EntryId>,
}

impl EntryCursor {
    pub(crate) fn new(next: EntryId) -> Self {
        Self {
            next,
            current: None,
        }
    }

    /// Advances and returns the next pair, or `Ok(None)` when the sentinel
    /// is reached.
    pub fn next<'a, K, V, S>(
        &mut self,
        map: &'a OrderedSetMultimap<K, V, S>,
    ) -> Result<Option<(&'a K, &'a V)>, CursorError> {
        if self.next == map.header {
            return Ok(None);
        }
        let node = map.slots.get(self.next).ok_or(CursorError::Desynced)?;
        self.current = Some(self.next);
        self.next = node.succ_global;
        Ok(Some((&map.keys[node.key].key, node.value())))
    }

    /// Removes the pair last returned by [`next`](Self::next) through the
    /// full removal path, so emptying a key's set drops the key as well.
    pub fn remove_current<K, V, S>(
        &mut self,
        map: &mut OrderedSetMultimap<K, V, S>,
    ) -> Result<V, CursorError> {
        let id = self.current.take().ok_or(CursorError::NoCurrent)?;
        let key_id = map.slots.get(id).ok_or(CursorError::Desynced)?.key;
        map.keys[key_id].set.unlink_entry(&mut map.slots, id);
        let node = map.unlink_global(id);
        map.dec_len();
        if map.keys[key_id].set.is_empty() {
            let _slot = map.release_key(key_id);
        }
        Ok(node.into_value())
    }
}
