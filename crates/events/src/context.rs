//! Per-invocation handler context.

use switchyard_core::SystemId;

use crate::dispatch::LentState;
use crate::{BusResult, Event, EventBus};

/// Handed to every handler invocation.
///
/// Gives handlers a way back into the bus without global state.
#[derive(Debug)]
pub struct Context<'a> {
    bus: &'a EventBus,
    system: SystemId,
    depth: usize,
}

impl<'a> Context<'a> {
    pub(crate) fn new(bus: &'a EventBus, system: SystemId, depth: usize) -> Self {
        Self { bus, system, depth }
    }

    pub fn bus(&self) -> &'a EventBus {
        self.bus
    }

    /// The system whose handler is running.
    pub fn system(&self) -> SystemId {
        self.system
    }

    /// Nesting level of the publish that triggered this invocation (1 for a top-level publish).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Publish a nested event.
    ///
    /// Runs synchronously; every handler completes before this returns. If the
    /// event routes back into the running system, that dispatch fails with
    /// [`BusError::Reentrant`](crate::BusError::Reentrant). Use
    /// [`publish_with_state`](Self::publish_with_state) when the system itself
    /// must see the nested event.
    pub fn publish<E: Event>(&self, event: E) -> BusResult<Vec<E::Reply>> {
        self.bus.publish(event)
    }

    /// Publish a nested event, lending this system's state to the dispatch.
    ///
    /// When the nested event reaches the running system, its handler runs on
    /// `state` directly instead of re-locking the slot. Other systems are
    /// dispatched as usual.
    pub fn publish_with_state<S, E>(&self, state: &mut S, event: E) -> BusResult<Vec<E::Reply>>
    where
        S: Send + 'static,
        E: Event,
    {
        self.bus.publish_lending(
            event,
            LentState {
                system: self.system,
                state,
            },
        )
    }
}
