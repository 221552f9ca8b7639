//! ordered-set-multimap: a single-threaded multimap with per-key set
//! semantics that preserves three insertion orders at once.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one storage arena, three live orderings, no duplicate (key,
//!   value) pairs, built in layers that can be reasoned about
//!   independently.
//! - Layers:
//!   - arena: every stored pair is a `Node` in a `SlotMap` with
//!     generational ids; a node carries its links for all three
//!     orderings. One reserved slot is the header sentinel bounding the
//!     circular global list.
//!   - ValueSet (one per live key): a hand-rolled open-chained hash table
//!     of bucket heads over the arena, the per-key insertion-order list,
//!     and a modification counter for cursor fail-fast checks.
//!   - OrderedSetMultimap: the public API; owns the arena, a key-slot
//!     arena with a `hashbrown::HashTable` index over it, and the key
//!     insertion-order list.
//!
//! Orderings (all maintained simultaneously, all live views)
//! - Key order: order of each key's *first* insertion. A key whose values
//!   are all removed leaves the order; re-adding it appends it at the
//!   end. That quirk is deliberate and kept.
//! - Per-key value order: insertion order of the values under one key.
//! - Global order: chronological order of every successful insertion
//!   across all keys. Duplicate inserts are rejected no-ops and appear
//!   nowhere.
//!
//! Constraints
//! - Single-threaded; no atomics, no locks. Concurrent modification is a
//!   caller problem; cursors merely detect it best-effort.
//! - Each node stores its value's hash once; `V: Hash` never runs during
//!   a resize, and `K: Hash` never runs after the key slot exists.
//! - Per-set tables double when len exceeds the bucket count (load
//!   factor 1.0), capped, and never shrink. Resizing rebuilds bucket
//!   chains by walking the order list, so no ordering can be disturbed.
//! - `insert`/`remove` are all-or-nothing: no partially linked node is
//!   ever observable, and a rejected duplicate does not even bump the
//!   modification counter.
//!
//! Iteration
//! - Borrowing iterators (`iter`, `keys`, `values`, `get`, `groups`) hold
//!   a shared borrow, so mutation during iteration is ruled out at
//!   compile time.
//! - Detached cursors (`set_cursor`, `entry_cursor`) hold ids instead of
//!   borrows and take the map on every call; they support removal at the
//!   cursor and fail fast with `CursorError::Desynced` when something
//!   else structurally modified the data under them. Generational arena
//!   ids make stale positions detectable, never aliased.
//!
//! Reentrancy policy
//! - Public entry points run user code only via `K`/`V` `Hash`/`Eq`
//!   during probing, and hold a debug-only reentrancy guard while they
//!   do; key and value drops are deferred until the guard is released.

mod arena;
mod cursor;
mod guard;
mod iter;
mod multimap;
mod multimap_proptest;
mod value_set;

// Public surface
pub use cursor::{CursorError, EntryCursor, SetCursor};
pub use iter::{Groups, Iter, Keys, SetValues, SetValuesIter, Values};
pub use multimap::OrderedSetMultimap;
