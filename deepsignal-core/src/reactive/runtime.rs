//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals and effects.
//! It owns the dependency edges and routes change notifications.
//!
//! # How It Works
//!
//! 1. When an effect is created, it registers with the runtime.
//!
//! 2. When an effect finishes a run, it hands the runtime the set of signals
//!    it read. Edges from the previous run are replaced.
//!
//! 3. When a signal's value changes, the runtime:
//!    a. Finds all subscribers of that signal
//!    b. Queues them on the current thread's batch
//!    c. Lets the batch run them once the outermost transaction closes
//!
//! # Thread Safety
//!
//! The edge maps are process-global concurrent maps, so signals can be shared
//! across threads. Tracking context and batch state are thread-local, which
//! keeps the common single-threaded case free of contention.

use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use smallvec::SmallVec;

use super::batch;
use super::context::Dependencies;
use super::subscriber::{Subscriber, SubscriberId};

type SubscriberList = SmallVec<[SubscriberId; 4]>;

/// Handle to a registered subscriber.
///
/// Dropping this handle unregisters the subscriber and removes its edges.
#[derive(Debug)]
pub struct ReactiveHandle {
    subscriber_id: SubscriberId,
}

impl ReactiveHandle {
    /// The subscriber this handle keeps registered.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }
}

impl Drop for ReactiveHandle {
    fn drop(&mut self) {
        Runtime::unregister(self.subscriber_id);
    }
}

/// The global reactive runtime.
pub struct Runtime;

// Weak references so the registry never keeps a disposed computation alive.
static REGISTRY: OnceLock<DashMap<SubscriberId, Weak<dyn Subscriber>>> = OnceLock::new();
// signal id -> subscribers that read it during their last run
static SIGNAL_SUBSCRIBERS: OnceLock<DashMap<u64, SubscriberList>> = OnceLock::new();
// subscriber id -> signals it read during its last run
static SUBSCRIBER_SIGNALS: OnceLock<DashMap<SubscriberId, Dependencies>> = OnceLock::new();

fn registry() -> &'static DashMap<SubscriberId, Weak<dyn Subscriber>> {
    REGISTRY.get_or_init(DashMap::new)
}

fn signal_subscribers() -> &'static DashMap<u64, SubscriberList> {
    SIGNAL_SUBSCRIBERS.get_or_init(DashMap::new)
}

fn subscriber_signals() -> &'static DashMap<SubscriberId, Dependencies> {
    SUBSCRIBER_SIGNALS.get_or_init(DashMap::new)
}

impl Runtime {
    /// Register a subscriber with the runtime.
    ///
    /// Returns a handle that unregisters the subscriber when dropped.
    pub fn register(subscriber: Arc<dyn Subscriber>) -> ReactiveHandle {
        let id = subscriber.subscriber_id();
        registry().insert(id, Arc::downgrade(&subscriber));
        ReactiveHandle { subscriber_id: id }
    }

    fn unregister(id: SubscriberId) {
        registry().remove(&id);
        Self::clear_dependencies(id);
    }

    /// Look up a live subscriber.
    pub fn subscriber(id: SubscriberId) -> Option<Arc<dyn Subscriber>> {
        // Clone the weak ref out so the shard lock is released before upgrade.
        let weak = registry().get(&id).map(|entry| entry.value().clone())?;
        weak.upgrade()
    }

    /// Record that a subscriber depends on a signal.
    pub fn add_dependency(signal_id: u64, subscriber_id: SubscriberId) {
        {
            let mut subs = signal_subscribers().entry(signal_id).or_default();
            if !subs.contains(&subscriber_id) {
                subs.push(subscriber_id);
            }
        }

        let mut signals = subscriber_signals().entry(subscriber_id).or_default();
        if !signals.contains(&signal_id) {
            signals.push(signal_id);
        }
    }

    /// Replace every edge of `subscriber_id` with `dependencies`.
    ///
    /// Called after each run of a computation so that signals it stopped
    /// reading no longer notify it.
    pub fn set_dependencies(subscriber_id: SubscriberId, dependencies: Dependencies) {
        Self::clear_dependencies(subscriber_id);
        for signal_id in dependencies {
            Self::add_dependency(signal_id, subscriber_id);
        }
    }

    /// Remove all dependencies for a subscriber.
    pub fn clear_dependencies(subscriber_id: SubscriberId) {
        let Some((_, signals)) = subscriber_signals().remove(&subscriber_id) else {
            return;
        };

        for signal_id in signals {
            let now_empty = match signal_subscribers().get_mut(&signal_id) {
                Some(mut subs) => {
                    subs.retain(|s| *s != subscriber_id);
                    subs.is_empty()
                }
                None => false,
            };
            if now_empty {
                signal_subscribers().remove_if(&signal_id, |_, subs| subs.is_empty());
            }
        }
    }

    /// Drop the edge list of a signal that no longer exists.
    pub fn forget_signal(signal_id: u64) {
        let Some((_, subs)) = signal_subscribers().remove(&signal_id) else {
            return;
        };

        for subscriber_id in subs {
            if let Some(mut signals) = subscriber_signals().get_mut(&subscriber_id) {
                signals.retain(|s| *s != signal_id);
            }
        }
    }

    /// Notify all subscribers that a signal changed.
    ///
    /// Subscribers are queued on the current batch. Outside any batch this
    /// opens a one-write batch, so they run before this call returns.
    pub fn notify_signal_change(signal_id: u64) {
        let subscriber_ids: SubscriberList = signal_subscribers()
            .get(&signal_id)
            .map(|subs| subs.value().clone())
            .unwrap_or_default();

        if subscriber_ids.is_empty() {
            return;
        }

        tracing::trace!(signal_id, subscribers = subscriber_ids.len(), "signal changed");

        batch::batch(|| {
            for id in subscriber_ids {
                batch::enqueue(id);
            }
        });
    }

    /// Number of subscribers currently depending on a signal.
    pub fn subscriber_count(signal_id: u64) -> usize {
        signal_subscribers()
            .get(&signal_id)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }

    /// Number of signals a subscriber read during its last run.
    pub fn dependency_count(subscriber_id: SubscriberId) -> usize {
        subscriber_signals()
            .get(&subscriber_id)
            .map(|signals| signals.len())
            .unwrap_or(0)
    }
}
