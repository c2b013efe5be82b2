//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read with [`Signal::get`] inside a reactive context
//!    (an effect run), the signal registers that context as a subscriber.
//!
//! 2. [`Signal::peek`] reads without registering anything.
//!
//! 3. When [`Signal::set`] stores a value different from the current one,
//!    all subscribers are notified through the runtime. Inside a
//!    [`batch`](super::batch) the notification waits for the batch to close.
//!
//! # Thread Safety
//!
//! The value sits behind a `parking_lot::RwLock` and handles are `Arc`s, so
//! a signal can be cloned across threads. Notification runs on the thread
//! that performed the write.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::runtime::Runtime;

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Shared state behind every clone of a signal.
struct SignalInner<T> {
    id: u64,
    value: RwLock<T>,
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        Runtime::forget_signal(self.id);
    }
}

/// A reactive signal holding a value of type T.
///
/// Cloning a signal yields another handle to the same cell.
///
/// # Example
///
/// ```rust
/// use deepsignal_core::reactive::Signal;
///
/// let count = Signal::new(0);
/// count.set(5);
/// count.update(|v| v + 1);
/// assert_eq!(count.peek(), 6);
/// ```
pub struct Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    inner: Arc<SignalInner<T>>,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                id: next_signal_id(),
                value: RwLock::new(value),
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the current value.
    ///
    /// If called within a reactive context, this also registers the
    /// current computation as a subscriber.
    pub fn get(&self) -> T {
        ReactiveContext::track_dependency(self.inner.id);
        self.inner.value.read().clone()
    }

    /// Register the current computation as a subscriber without reading.
    pub fn track(&self) {
        ReactiveContext::track_dependency(self.inner.id);
    }

    /// Get the current value without tracking dependencies.
    pub fn peek(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Set a new value and notify subscribers.
    ///
    /// Returns whether the value changed. Writing a value equal to the
    /// current one notifies nobody.
    pub fn set(&self, value: T) -> bool {
        {
            let mut guard = self.inner.value.write();
            if *guard == value {
                return false;
            }
            *guard = value;
        }

        Runtime::notify_signal_change(self.inner.id);
        true
    }

    /// Store `value` and notify subscribers even if it equals the current
    /// value.
    pub(crate) fn replace(&self, value: T) {
        *self.inner.value.write() = value;
        Runtime::notify_signal_change(self.inner.id);
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = {
            let guard = self.inner.value.read();
            f(&guard)
        };
        self.set(new_value)
    }

    /// Get the number of computations currently depending on this signal.
    pub fn subscriber_count(&self) -> usize {
        Runtime::subscriber_count(self.inner.id)
    }

    /// Whether two handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.read())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{untrack, Effect};
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        assert!(signal.set(42));
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let signal = Signal::new(10);
        signal.update(|v| v + 5);
        assert_eq!(signal.peek(), 15);
    }

    #[test]
    fn signal_same_value_write_is_silent() {
        let signal = Signal::new(3);
        let runs = Arc::new(AtomicUsize::new(0));

        let signal_clone = signal.clone();
        let runs_clone = runs.clone();
        let _effect = Effect::new(move || {
            signal_clone.get();
            runs_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!signal.set(3));
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        assert!(signal.set(4));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn signal_replace_notifies_on_equal_values() {
        let signal = Signal::new(3);
        let runs = Arc::new(AtomicUsize::new(0));

        let signal_clone = signal.clone();
        let runs_clone = runs.clone();
        let _effect = Effect::new(move || {
            signal_clone.get();
            runs_clone.fetch_add(1, Ordering::SeqCst);
        });

        signal.replace(3);
        assert_eq!(signal.peek(), 3);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn signal_peek_does_not_subscribe() {
        let signal = Signal::new(0);
        let runs = Arc::new(AtomicUsize::new(0));

        let signal_clone = signal.clone();
        let runs_clone = runs.clone();
        let _effect = Effect::new(move || {
            signal_clone.peek();
            untrack(|| signal_clone.get());
            runs_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(signal.subscriber_count(), 0);
        signal.set(1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn signal_clone_shares_state() {
        let signal1 = Signal::new(0);
        let signal2 = signal1.clone();

        signal1.set(42);
        assert_eq!(signal2.get(), 42);

        signal2.set(100);
        assert_eq!(signal1.get(), 100);
        assert!(signal1.ptr_eq(&signal2));
    }

    #[test]
    fn signal_ids_are_unique() {
        let s1 = Signal::new(0);
        let s2 = Signal::new(0);
        let s3 = Signal::new(0);

        assert_ne!(s1.id(), s2.id());
        assert_ne!(s2.id(), s3.id());
        assert_ne!(s1.id(), s3.id());
    }
}
