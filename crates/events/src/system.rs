use crate::{BusResult, EventBus, SystemHandle};

/// A stateful component that reacts to events.
///
/// The only contract is `initialize`, called exactly once by
/// [`EventBus::add_system`] right after the system's slot is created. It is
/// where the system subscribes its handlers:
///
/// ```ignore
/// impl System for Counter {
///     fn initialize(bus: &EventBus, this: &SystemHandle<Self>) -> BusResult<()> {
///         bus.subscribe(this, |c: &mut Counter, _: &Tick, _: &Context<'_>| c.count += 1)
///     }
/// }
/// ```
pub trait System: Send + Sized + 'static {
    fn initialize(bus: &EventBus, this: &SystemHandle<Self>) -> BusResult<()>;
}
