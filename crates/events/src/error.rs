//! Bus error model.

use switchyard_core::SystemId;
use thiserror::Error;

/// Result type returned by every fallible bus operation.
pub type BusResult<T> = Result<T, BusError>;

/// Failures surfaced by the bus.
///
/// A missing handler or an event type nobody subscribed to is *not* an error;
/// those dispatches are silent no-ops.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A handler panicked while holding this system's state lock.
    ///
    /// The state may be half-updated; the slot refuses all further access.
    #[error("system {system_type} ({system}) is poisoned by an earlier handler panic")]
    Poisoned {
        system: SystemId,
        system_type: &'static str,
    },

    /// A dispatch tried to re-enter a system whose handler is still running on this thread.
    #[error("re-entrant dispatch of {event_type} into system {system_type} ({system})")]
    Reentrant {
        system: SystemId,
        system_type: &'static str,
        event_type: &'static str,
    },

    /// Nested publishing on one thread went deeper than `BusConfig::max_publish_depth`.
    #[error("publish depth limit {limit} exceeded while publishing {event_type}")]
    DepthExceeded {
        limit: usize,
        event_type: &'static str,
    },

    /// The event type directory lock is poisoned.
    #[error("event channel directory is poisoned")]
    DirectoryPoisoned,

    /// A channel's subscriber list lock is poisoned.
    #[error("subscriber list for {event_type} is poisoned")]
    ChannelPoisoned { event_type: &'static str },

    /// A system's handler registry lock is poisoned.
    #[error("handler registry of system {system_type} ({system}) is poisoned")]
    HandlersPoisoned {
        system: SystemId,
        system_type: &'static str,
    },
}

impl BusError {
    /// Identity of the system the error is about, if any.
    pub fn system(&self) -> Option<SystemId> {
        match self {
            Self::Poisoned { system, .. }
            | Self::Reentrant { system, .. }
            | Self::HandlersPoisoned { system, .. } => Some(*system),
            Self::DepthExceeded { .. } | Self::DirectoryPoisoned | Self::ChannelPoisoned { .. } => {
                None
            }
        }
    }
}
