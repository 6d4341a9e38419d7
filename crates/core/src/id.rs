//! Strongly-typed identifiers.

use uuid::Uuid;

/// Identifier of a registered system (one per system slot).
///
/// UUIDv7 (time-ordered), so ids of systems registered later sort later.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SystemId(Uuid);

impl SystemId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SystemId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SystemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
