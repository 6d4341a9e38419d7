//! System slots: one system's state plus its private handler registry.

use std::any::type_name;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use switchyard_core::{SystemId, TypeMap};
use tracing::{debug, error, warn};

use crate::context::Context;
use crate::dispatch::{self, ActiveSlot, LentState};
use crate::{BusError, BusResult, Event, EventBus};

/// A handler bound to one (system, event) pair.
pub type Handler<S, E> =
    dyn for<'c> Fn(&mut S, &E, &Context<'c>) -> <E as Event>::Reply + Send + Sync;

/// Owns one system's state and the handlers it registered.
///
/// State sits behind an exclusive lock; every dispatch mutates it. Handlers
/// live in a separate registry keyed by event type, so a handler can be
/// looked up (or replaced) without touching the state lock.
pub struct SystemSlot<S> {
    id: SystemId,
    state: Mutex<S>,
    handlers: RwLock<TypeMap>,
}

/// Shared, cheaply cloneable reference to a [`SystemSlot`].
pub struct SystemHandle<S> {
    slot: Arc<SystemSlot<S>>,
}

impl<S> Clone for SystemHandle<S> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<S> core::fmt::Debug for SystemHandle<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SystemHandle")
            .field("id", &self.slot.id)
            .field("system_type", &type_name::<S>())
            .finish()
    }
}

impl<S> SystemHandle<S>
where
    S: Send + 'static,
{
    pub(crate) fn new(state: S) -> Self {
        Self {
            slot: Arc::new(SystemSlot {
                id: SystemId::new(),
                state: Mutex::new(state),
                handlers: RwLock::new(TypeMap::new()),
            }),
        }
    }

    pub fn id(&self) -> SystemId {
        self.slot.id
    }

    pub fn system_type(&self) -> &'static str {
        type_name::<S>()
    }

    /// `true` if both handles refer to the same slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    /// Register (or replace) this system's handler for `E`.
    ///
    /// This only updates the system's own registry; it does not add the
    /// system to `E`'s channel. Application code goes through
    /// [`EventBus::subscribe`]. Returns `true` if a previous handler was replaced.
    pub fn subscribe<E, F>(&self, handler: F) -> BusResult<bool>
    where
        E: Event,
        F: Fn(&mut S, &E, &Context<'_>) -> E::Reply + Send + Sync + 'static,
    {
        let mut handlers = self.handlers_write()?;
        let handler: Arc<Handler<S, E>> = Arc::new(handler);
        Ok(handlers.insert_dyn::<Handler<S, E>>(handler))
    }

    /// `true` if a handler for `E` is registered.
    pub fn has_handler<E: Event>(&self) -> BusResult<bool> {
        Ok(self.handlers_read()?.contains_dyn::<Handler<S, E>>())
    }

    /// Dispatch `event` into this system.
    ///
    /// Holds the state lock for exactly one handler invocation. Returns
    /// `Ok(None)` if the system has no handler for `E`.
    pub fn handle<E: Event>(&self, event: &E, bus: &EventBus) -> BusResult<Option<E::Reply>> {
        self.dispatch(event, bus, None)
    }

    pub(crate) fn dispatch<E: Event>(
        &self,
        event: &E,
        bus: &EventBus,
        lent: Option<&mut LentState<'_>>,
    ) -> BusResult<Option<E::Reply>> {
        if let Some(lent) = lent.filter(|l| l.system == self.slot.id) {
            if let Some(state) = lent.state.downcast_mut::<S>() {
                let Some(handler) = self.handler::<E>()? else {
                    return Ok(None);
                };
                debug!(
                    system = %self.slot.id,
                    system_type = self.system_type(),
                    event_type = type_name::<E>(),
                    "dispatching into lent state"
                );
                let ctx = Context::new(bus, self.slot.id, dispatch::publish_depth());
                return Ok(Some(handler(state, event, &ctx)));
            }
        }

        let mut state = self.lock_state(type_name::<E>())?;
        let Some(handler) = self.handler::<E>()? else {
            return Ok(None);
        };
        let _active = ActiveSlot::enter(self.slot.id);
        let ctx = Context::new(bus, self.slot.id, dispatch::publish_depth());
        Ok(Some(handler(&mut *state, event, &ctx)))
    }

    /// Run `f` with shared access to the system's state.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> BusResult<R> {
        let state = self.lock_state("<state access>")?;
        Ok(f(&state))
    }

    /// Run `f` with exclusive access to the system's state.
    pub fn with_state_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> BusResult<R> {
        let mut state = self.lock_state("<state access>")?;
        Ok(f(&mut state))
    }

    fn handler<E: Event>(&self) -> BusResult<Option<Arc<Handler<S, E>>>> {
        Ok(self.handlers_read()?.get_dyn::<Handler<S, E>>())
    }

    fn lock_state(&self, event_type: &'static str) -> BusResult<MutexGuard<'_, S>> {
        if dispatch::is_active(self.slot.id) {
            warn!(
                system = %self.slot.id,
                system_type = self.system_type(),
                event_type,
                "rejected re-entrant dispatch into a running system"
            );
            return Err(BusError::Reentrant {
                system: self.slot.id,
                system_type: self.system_type(),
                event_type,
            });
        }

        self.slot.state.lock().map_err(|_| {
            error!(
                system = %self.slot.id,
                system_type = self.system_type(),
                event_type,
                "system state is poisoned"
            );
            BusError::Poisoned {
                system: self.slot.id,
                system_type: self.system_type(),
            }
        })
    }

    fn handlers_read(&self) -> BusResult<std::sync::RwLockReadGuard<'_, TypeMap>> {
        self.slot
            .handlers
            .read()
            .map_err(|_| self.handlers_poisoned())
    }

    fn handlers_write(&self) -> BusResult<std::sync::RwLockWriteGuard<'_, TypeMap>> {
        self.slot
            .handlers
            .write()
            .map_err(|_| self.handlers_poisoned())
    }

    fn handlers_poisoned(&self) -> BusError {
        error!(
            system = %self.slot.id,
            system_type = self.system_type(),
            "handler registry is poisoned"
        );
        BusError::HandlersPoisoned {
            system: self.slot.id,
            system_type: self.system_type(),
        }
    }
}
