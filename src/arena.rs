//! Entry arena: generational ids and the node record.
//!
//! Every stored (key, value) pair is one `Node` in a `SlotMap` arena.
//! A node sits in three link structures at once: the circular global
//! insertion-order list (plain ids, threaded through a header sentinel),
//! the per-key value list (`Option` ids, no sentinel), and the singly
//! linked bucket chain of its key's hash table. Keys are stored once per
//! distinct key in a second arena; nodes refer to their key slot by id.

slotmap::new_key_type! {
    /// Generational id of one stored (key, value) node.
    pub(crate) struct EntryId;
    /// Generational id of one key slot.
    pub(crate) struct KeyId;
}

#[derive(Debug)]
pub(crate) struct Node<V> {
    /// Owning key slot. Null only for the header sentinel.
    pub(crate) key: KeyId,
    /// `None` only for the header sentinel.
    pub(crate) value: Option<V>,
    /// Cached hash of the value; indexing never re-runs `V: Hash`.
    pub(crate) hash: u64,
    pub(crate) pred_global: EntryId,
    pub(crate) succ_global: EntryId,
    pub(crate) pred_in_set: Option<EntryId>,
    pub(crate) succ_in_set: Option<EntryId>,
    pub(crate) next_in_bucket: Option<EntryId>,
}

impl<V> Node<V> {
    pub(crate) fn value(&self) -> &V {
        self.value.as_ref().expect("header node carries no value")
    }

    pub(crate) fn into_value(self) -> V {
        self.value.expect("header node carries no value")
    }
}
