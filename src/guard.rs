//! Debug-only reentrancy check.
//!
//! The multimap runs user code (`Hash`/`Eq` on keys and values) while its
//! internal lists and tables may be mid-splice. This tracker catches code
//! that re-enters the structure from inside such a callback: in debug
//! builds a nested entry panics, in release builds the whole thing
//! compiles down to nothing.
//!
//! The guard shares ownership of the flag instead of borrowing the
//! tracker, so a guarded method can keep calling `&mut self` helpers
//! while the guard is live.

use core::cell::Cell;
use core::marker::PhantomData;
#[cfg(debug_assertions)]
use std::rc::Rc;

/// Per-instance reentrancy tracker. Guard public entry points with
/// `let _g = self.guard.enter();`.
#[derive(Debug)]
pub(crate) struct ReentryCheck {
    #[cfg(debug_assertions)]
    active: Rc<Cell<bool>>,
    // Must be !Send + !Sync, matching the single-threaded design.
    _nosend: PhantomData<*mut ()>,
}

impl ReentryCheck {
    pub(crate) fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Rc::new(Cell::new(false)),
            _nosend: PhantomData,
        }
    }

    /// Enter a guarded section. In debug builds, panics if already entered.
    #[inline]
    pub(crate) fn enter(&self) -> ReentryGuard {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.get(),
                "reentrancy detected: nested entry into the multimap"
            );
            self.active.set(true);
            return ReentryGuard {
                active: Rc::clone(&self.active),
            };
        }

        #[cfg(not(debug_assertions))]
        {
            return ReentryGuard { _nosend: PhantomData };
        }
    }
}

impl Default for ReentryCheck {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by [`ReentryCheck::enter`]. Owns its handle on the
/// flag; holding one does not borrow the tracker or its owner.
pub(crate) struct ReentryGuard {
    #[cfg(debug_assertions)]
    active: Rc<Cell<bool>>,
    #[cfg(not(debug_assertions))]
    _nosend: PhantomData<*mut ()>,
}

impl Drop for ReentryGuard {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.active.set(false);
    }
}
