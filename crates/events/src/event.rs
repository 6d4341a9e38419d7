/// A value broadcast through the bus, identified by its concrete type.
///
/// Events carry no required structure. The only thing an event type decides
/// is what its handlers hand back to the publisher: `Reply` is collected, one
/// per invoked handler, into the `Vec` returned by [`EventBus::publish`].
/// Fire-and-forget events use `()`.
///
/// Use the [`event!`](crate::event!) macro instead of writing the impl by hand.
///
/// [`EventBus::publish`]: crate::EventBus::publish
pub trait Event: Send + Sync + 'static {
    type Reply: 'static;
}

/// Implement [`Event`] for one or more types.
///
/// ```ignore
/// struct Tick;
/// struct Query(u32);
///
/// switchyard_events::event!(Tick);
/// switchyard_events::event!(Query => Option<String>);
/// ```
#[macro_export]
macro_rules! event {
    ($t:ty => $reply:ty) => {
        impl $crate::Event for $t {
            type Reply = $reply;
        }
    };
    ($($t:ty),+ $(,)?) => {
        $(
            impl $crate::Event for $t {
                type Reply = ();
            }
        )+
    };
}
