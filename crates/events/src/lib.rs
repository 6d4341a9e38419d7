//! `switchyard-events` — typed, synchronous, in-process event bus.
//!
//! Systems (stateful components) register with an [`EventBus`] and subscribe
//! handlers per event type. Publishing an event runs every subscribed handler
//! on the calling thread, in subscription order, each with exclusive access
//! to its own system's state.
//!
//! ```ignore
//! use switchyard_events::{event, BusResult, Context, EventBus, System, SystemHandle};
//!
//! struct Tick;
//! event!(Tick);
//!
//! #[derive(Default)]
//! struct Counter { count: u32 }
//!
//! impl System for Counter {
//!     fn initialize(bus: &EventBus, this: &SystemHandle<Self>) -> BusResult<()> {
//!         bus.subscribe(this, |c: &mut Counter, _: &Tick, _: &Context<'_>| c.count += 1)
//!     }
//! }
//!
//! let bus = EventBus::new();
//! let counter = bus.add_system(Counter::default())?;
//! bus.publish(Tick)?;
//! assert_eq!(counter.with_state(|c| c.count)?, 1);
//! ```

pub mod bus;
pub mod channel;
pub mod config;
pub mod context;
mod dispatch;
pub mod error;
pub mod event;
pub mod slot;
pub mod stats;
pub mod system;

pub use bus::EventBus;
pub use channel::EventChannel;
pub use config::BusConfig;
pub use context::Context;
pub use error::{BusError, BusResult};
pub use event::Event;
pub use slot::{Handler, SystemHandle, SystemSlot};
pub use stats::BusStats;
pub use switchyard_core::SystemId;
pub use system::System;
