//! Subscriber types for the reactive system.
//!
//! A Subscriber represents any computation that re-runs when the signals it
//! read are written. Effects are the only subscribers the crate ships, but the
//! runtime only ever talks to the [`Subscriber`] trait.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a subscriber.
///
/// Each reactive computation gets a unique ID when created. The runtime keys
/// dependency edges and the pending-run queue by this ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A computation that can be notified when one of its dependencies changes.
pub trait Subscriber: Send + Sync {
    /// Get the subscriber ID for this computation.
    fn subscriber_id(&self) -> SubscriberId;

    /// Re-run the computation.
    ///
    /// Called by the runtime once per notification round, never while a
    /// batch is still open.
    fn notify(&self);
}
