//! Bus statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time bus statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BusStats {
    pub systems: u64,
    pub channels: u64,
    pub events_published: u64,
    pub handlers_invoked: u64,
    pub dispatch_failures: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    systems: AtomicU64,
    channels: AtomicU64,
    events_published: AtomicU64,
    handlers_invoked: AtomicU64,
    dispatch_failures: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_system(&self) {
        self.systems.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_channel(&self) {
        self.channels.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_publish(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handlers(&self, n: usize) {
        self.handlers_invoked.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BusStats {
        BusStats {
            systems: self.systems.load(Ordering::Relaxed),
            channels: self.channels.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            handlers_invoked: self.handlers_invoked.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
        }
    }
}
