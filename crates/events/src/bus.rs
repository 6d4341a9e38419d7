//! The event bus: directory of channels and public entry point.
//!
//! ## Dispatch model
//!
//! - **Synchronous**: `publish` runs every handler on the calling thread and
//!   returns after the last one completes
//! - **Ordered**: handlers run in the order their systems first subscribed
//! - **Typed**: channels, handlers and replies are keyed by the event's Rust type
//!
//! ## Locking
//!
//! The directory (event type → channel) is behind an `RwLock`; publishing to
//! an existing channel only takes the read side. Each channel has its own
//! subscriber lock, so publishes of different event types never contend.
//! Each system's state has its own exclusive lock, taken for one handler
//! invocation at a time. No bus lock is held while a handler runs, so
//! handlers may publish, subscribe or register systems.
//!
//! ## Re-entrancy
//!
//! A dispatch that would re-lock a system whose handler is already running on
//! the same thread fails with [`BusError::Reentrant`] instead of deadlocking.
//! A handler that needs its own system to observe a nested event lends its
//! state explicitly with [`Context::publish_with_state`].
//!
//! [`Context::publish_with_state`]: crate::Context::publish_with_state

use std::any::type_name;
use std::sync::{Arc, RwLock};

use switchyard_core::TypeMap;
use tracing::{error, info, warn};

use crate::channel::EventChannel;
use crate::config::BusConfig;
use crate::context::Context;
use crate::dispatch::{LentState, PublishScope};
use crate::stats::{BusStats, StatsCounters};
use crate::{BusError, BusResult, Event, System, SystemHandle};

/// Shareable handle to an event bus.
///
/// Clones refer to the same directory, systems and statistics.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    config: BusConfig,
    channels: RwLock<TypeMap>,
    stats: StatsCounters,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_config(BusConfig::default())
    }
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("name", &self.inner.config.name)
            .field("stats", &self.inner.stats.snapshot())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            inner: Arc::new(BusInner {
                config,
                channels: RwLock::new(TypeMap::new()),
                stats: StatsCounters::default(),
            }),
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Register a system and let it subscribe its handlers.
    ///
    /// The system's state moves into a new slot, then `S::initialize` runs
    /// exactly once. Systems are never unregistered.
    pub fn add_system<S: System>(&self, initial: S) -> BusResult<SystemHandle<S>> {
        let handle = SystemHandle::new(initial);
        self.inner.stats.record_system();
        info!(
            bus = %self.inner.config.name,
            system = %handle.id(),
            system_type = handle.system_type(),
            "registering system"
        );

        S::initialize(self, &handle)?;
        Ok(handle)
    }

    /// Subscribe `system` to events of type `E`.
    ///
    /// The first subscription of a system to `E` appends it to `E`'s
    /// subscriber list; later ones only replace its handler.
    pub fn subscribe<S, E, F>(&self, system: &SystemHandle<S>, handler: F) -> BusResult<()>
    where
        S: Send + 'static,
        E: Event,
        F: Fn(&mut S, &E, &Context<'_>) -> E::Reply + Send + Sync + 'static,
    {
        self.channel::<E>()?.subscribe(system, handler)
    }

    /// Deliver `event` to every subscriber of `E`, in subscription order.
    ///
    /// Returns one reply per handler invoked; empty if nobody subscribed.
    /// If any subscriber fails, the remaining ones still run and the first
    /// failure is returned.
    pub fn publish<E: Event>(&self, event: E) -> BusResult<Vec<E::Reply>> {
        self.publish_inner(event, None)
    }

    pub(crate) fn publish_lending<E: Event>(
        &self,
        event: E,
        lent: LentState<'_>,
    ) -> BusResult<Vec<E::Reply>> {
        self.publish_inner(event, Some(lent))
    }

    fn publish_inner<E: Event>(
        &self,
        event: E,
        lent: Option<LentState<'_>>,
    ) -> BusResult<Vec<E::Reply>> {
        let event_type = type_name::<E>();
        let scope = PublishScope::enter();
        let limit = self.inner.config.max_publish_depth;
        if scope.depth() > limit {
            warn!(
                bus = %self.inner.config.name,
                event_type,
                limit,
                "publish depth limit exceeded"
            );
            self.inner.stats.record_failure();
            return Err(BusError::DepthExceeded { limit, event_type });
        }

        let channel = self.channel::<E>()?;
        self.inner.stats.record_publish();

        let outcome = match channel.fan_out(&event, self, lent) {
            Ok(fan_out) => {
                self.inner.stats.record_handlers(fan_out.replies.len());
                fan_out.into_result()
            }
            Err(e) => Err(e),
        };
        if outcome.is_err() {
            self.inner.stats.record_failure();
        }
        outcome
    }

    /// Number of systems subscribed to `E` (0 if no channel exists yet).
    pub fn subscriber_count<E: Event>(&self) -> BusResult<usize> {
        let channels = self.read_channels()?;
        match channels.get::<Arc<EventChannel<E>>>() {
            Some(channel) => channel.len(),
            None => Ok(0),
        }
    }

    /// Number of event types with a channel.
    pub fn channel_count(&self) -> BusResult<usize> {
        Ok(self.read_channels()?.len())
    }

    pub fn stats(&self) -> BusStats {
        self.inner.stats.snapshot()
    }

    /// `true` if both handles refer to the same bus.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Resolve the channel for `E`, creating it on first use.
    fn channel<E: Event>(&self) -> BusResult<Arc<EventChannel<E>>> {
        if let Some(channel) = self.read_channels()?.get::<Arc<EventChannel<E>>>() {
            return Ok(Arc::clone(channel));
        }

        // Another thread may create the channel between the read and write
        // locks; `get_or_insert_with` re-checks under the write lock.
        let mut created = false;
        let channel = {
            let mut channels = self
                .inner
                .channels
                .write()
                .map_err(|_| self.directory_poisoned())?;
            Arc::clone(channels.get_or_insert_with(|| {
                created = true;
                Arc::new(EventChannel::<E>::new())
            }))
        };

        if created {
            self.inner.stats.record_channel();
            info!(
                bus = %self.inner.config.name,
                event_type = type_name::<E>(),
                "created event channel"
            );
        }
        Ok(channel)
    }

    fn read_channels(&self) -> BusResult<std::sync::RwLockReadGuard<'_, TypeMap>> {
        self.inner
            .channels
            .read()
            .map_err(|_| self.directory_poisoned())
    }

    fn directory_poisoned(&self) -> BusError {
        error!(bus = %self.inner.config.name, "event channel directory is poisoned");
        BusError::DirectoryPoisoned
    }
}
