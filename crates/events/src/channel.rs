//! Per-event-type subscriber lists.

use std::any::type_name;
use std::sync::{Arc, RwLock};

use switchyard_core::SystemId;
use tracing::debug;

use crate::context::Context;
use crate::dispatch::{self, LentState};
use crate::{BusError, BusResult, Event, EventBus, SystemHandle};

/// A dispatch target bound to one system, fixed to the channel's event type.
pub(crate) trait Caller<E: Event>: Send + Sync {
    fn system(&self) -> SystemId;

    fn call(
        &self,
        event: &E,
        bus: &EventBus,
        lent: Option<&mut LentState<'_>>,
    ) -> BusResult<Option<E::Reply>>;
}

impl<S, E> Caller<E> for SystemHandle<S>
where
    S: Send + 'static,
    E: Event,
{
    fn system(&self) -> SystemId {
        self.id()
    }

    fn call(
        &self,
        event: &E,
        bus: &EventBus,
        lent: Option<&mut LentState<'_>>,
    ) -> BusResult<Option<E::Reply>> {
        self.dispatch(event, bus, lent)
    }
}

/// Outcome of one fan-out: the replies of every handler that ran, plus the
/// first dispatch failure if any subscriber failed.
pub(crate) struct FanOut<R> {
    pub(crate) replies: Vec<R>,
    pub(crate) first_error: Option<BusError>,
}

impl<R> FanOut<R> {
    pub(crate) fn into_result(self) -> BusResult<Vec<R>> {
        match self.first_error {
            Some(e) => Err(e),
            None => Ok(self.replies),
        }
    }
}

/// Ordered subscribers of one event type.
///
/// Append-only: a system joins the list the first time it subscribes to `E`
/// and keeps that position for the life of the channel.
pub struct EventChannel<E: Event> {
    callers: RwLock<Vec<Arc<dyn Caller<E>>>>,
}

impl<E: Event> Default for EventChannel<E> {
    fn default() -> Self {
        Self {
            callers: RwLock::new(Vec::new()),
        }
    }
}

impl<E: Event> core::fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventChannel")
            .field("event_type", &type_name::<E>())
            .field("subscribers", &self.len().ok())
            .finish()
    }
}

impl<E: Event> EventChannel<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` on the system and append the system as a subscriber.
    ///
    /// Subscribing a system that is already in the list only replaces its handler.
    pub fn subscribe<S, F>(&self, system: &SystemHandle<S>, handler: F) -> BusResult<()>
    where
        S: Send + 'static,
        F: Fn(&mut S, &E, &Context<'_>) -> E::Reply + Send + Sync + 'static,
    {
        let replaced = system.subscribe::<E, F>(handler)?;

        let mut callers = self.callers.write().map_err(|_| Self::poisoned())?;
        let position = match callers.iter().position(|c| c.system() == system.id()) {
            Some(position) => position,
            None => {
                callers.push(Arc::new(system.clone()));
                callers.len() - 1
            }
        };

        debug!(
            system = %system.id(),
            system_type = system.system_type(),
            event_type = type_name::<E>(),
            position,
            replaced,
            "subscribed handler"
        );
        Ok(())
    }

    /// Invoke every subscriber in order and collect their replies.
    ///
    /// The subscriber list is snapshotted and its lock released before the
    /// first handler runs, so handlers may publish or subscribe freely.
    /// A failing subscriber does not stop the fan-out: every other subscriber
    /// still runs, and the first failure is returned afterwards.
    pub fn publish(&self, event: &E, bus: &EventBus) -> BusResult<Vec<E::Reply>> {
        self.fan_out(event, bus, None)?.into_result()
    }

    pub(crate) fn fan_out(
        &self,
        event: &E,
        bus: &EventBus,
        mut lent: Option<LentState<'_>>,
    ) -> BusResult<FanOut<E::Reply>> {
        let callers: Vec<Arc<dyn Caller<E>>> =
            self.callers.read().map_err(|_| Self::poisoned())?.clone();
        debug!(
            bus = %bus.config().name,
            event_type = type_name::<E>(),
            subscribers = callers.len(),
            depth = dispatch::publish_depth(),
            "dispatching event"
        );

        let mut fan_out = FanOut {
            replies: Vec::with_capacity(callers.len()),
            first_error: None,
        };
        for caller in &callers {
            match caller.call(event, bus, lent.as_mut()) {
                Ok(Some(reply)) => fan_out.replies.push(reply),
                Ok(None) => {}
                Err(e) => {
                    fan_out.first_error.get_or_insert(e);
                }
            }
        }
        Ok(fan_out)
    }

    /// Number of subscribed systems.
    pub fn len(&self) -> BusResult<usize> {
        let callers = self.callers.read().map_err(|_| Self::poisoned())?;
        Ok(callers.len())
    }

    pub fn is_empty(&self) -> BusResult<bool> {
        Ok(self.len()? == 0)
    }

    fn poisoned() -> BusError {
        BusError::ChannelPoisoned {
            event_type: type_name::<E>(),
        }
    }

    /// Poison the subscriber list lock.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.callers.write();
            panic!("subscriber list poisoned on purpose");
        }));
    }
}
