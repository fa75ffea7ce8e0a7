//! Opaque handles for properties and subscriptions.
//!
//! A [`PropertyId`] is an index into the owning depot's arena. It is handed
//! out at registration time, which is the only point where validation
//! happens: holding an id proves the property exists, so lookups by id never
//! re-check names. Ids are meaningful only within the depot that issued
//! them.

/// Unique identifier for a property within one depot.
///
/// Copyable, cheap, and stable for the life of the depot (properties are
/// never removed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyId(u32);

impl PropertyId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).expect("property arena exceeds u32 index space"))
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw id value.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Token returned by `subscribe`, used to remove the subscription later.
///
/// Tokens are unique across all properties of one depot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw token value.
    pub fn raw(self) -> u64 {
        self.0
    }
}
