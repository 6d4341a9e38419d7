//! Per-thread dispatch bookkeeping.
//!
//! Tracks which system slots have their state locked by a handler running on
//! the current thread, and how deeply `publish` calls are nested. Both are
//! unwound by drop guards, so a panicking handler never leaves stale entries.

use std::any::Any;
use std::cell::{Cell, RefCell};

use switchyard_core::SystemId;

thread_local! {
    static ACTIVE_SLOTS: RefCell<Vec<SystemId>> = const { RefCell::new(Vec::new()) };
    static PUBLISH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// `true` if a handler of `system` is currently executing on this thread.
pub(crate) fn is_active(system: SystemId) -> bool {
    ACTIVE_SLOTS.with(|active| active.borrow().contains(&system))
}

/// Marks a slot as executing a handler on this thread until dropped.
pub(crate) struct ActiveSlot {
    system: SystemId,
}

impl ActiveSlot {
    pub(crate) fn enter(system: SystemId) -> Self {
        ACTIVE_SLOTS.with(|active| active.borrow_mut().push(system));
        Self { system }
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        ACTIVE_SLOTS.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(pos) = active.iter().rposition(|id| *id == self.system) {
                active.remove(pos);
            }
        });
    }
}

/// Current nesting of `publish` calls on this thread (0 outside any publish).
pub(crate) fn publish_depth() -> usize {
    PUBLISH_DEPTH.with(Cell::get)
}

/// One level of `publish` nesting, released on drop.
pub(crate) struct PublishScope {
    depth: usize,
}

impl PublishScope {
    pub(crate) fn enter() -> Self {
        let depth = PUBLISH_DEPTH.with(|d| {
            let depth = d.get() + 1;
            d.set(depth);
            depth
        });
        Self { depth }
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }
}

impl Drop for PublishScope {
    fn drop(&mut self) {
        PUBLISH_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// A system's state handed to a nested publish by the handler that owns it.
///
/// While a handler runs, its slot's state lock is held. A handler that wants
/// its own system to observe a nested event lends `&mut state` for the
/// duration of that publish; the slot then dispatches into the lent state
/// instead of locking again.
pub(crate) struct LentState<'a> {
    pub(crate) system: SystemId,
    pub(crate) state: &'a mut (dyn Any + Send),
}
