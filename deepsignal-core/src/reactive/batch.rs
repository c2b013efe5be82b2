//! Batched Notification
//!
//! A batch coalesces any number of signal writes into a single notification
//! round. Subscribers notified while a batch is open are queued instead of
//! run; when the outermost batch closes the queue is drained in the order
//! subscribers were first notified.
//!
//! Batches nest by reference count. Computations that write signals while the
//! queue is being drained push onto the same queue, so the drain keeps going
//! until the graph is quiet.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};

use super::runtime::Runtime;
use super::subscriber::SubscriberId;

/// Per-thread batch state.
#[derive(Default)]
struct BatchState {
    /// Number of open batches.
    depth: usize,
    /// Whether the queue is currently being drained.
    draining: bool,
    /// Subscribers waiting to run, in first-notified order.
    queue: VecDeque<SubscriberId>,
    /// Members of `queue`. A subscriber is queued at most once.
    pending: HashSet<SubscriberId>,
}

impl BatchState {
    fn push(&mut self, id: SubscriberId) {
        if self.pending.insert(id) {
            self.queue.push_back(id);
        }
    }

    fn pop(&mut self) -> Option<SubscriberId> {
        let id = self.queue.pop_front()?;
        self.pending.remove(&id);
        Some(id)
    }

    fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
    }
}

thread_local! {
    static BATCH: RefCell<BatchState> = RefCell::new(BatchState::default());
}

/// Guard for one open batch.
///
/// Closing the outermost guard drains the queue.
struct BatchGuard;

impl BatchGuard {
    fn open() -> Self {
        BATCH.with(|state| state.borrow_mut().depth += 1);
        Self
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let should_drain = BATCH.with(|state| {
            let mut state = state.borrow_mut();
            state.depth = state.depth.saturating_sub(1);
            state.depth == 0 && !state.draining
        });

        if !should_drain {
            return;
        }

        if std::thread::panicking() {
            // Effects must not run on top of an unwinding write.
            BATCH.with(|state| state.borrow_mut().clear());
            return;
        }

        drain();
    }
}

/// Resets the draining flag even if a subscriber panics.
struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        BATCH.with(|state| {
            let mut state = state.borrow_mut();
            state.draining = false;
            if std::thread::panicking() {
                state.clear();
            }
        });
    }
}

fn drain() {
    BATCH.with(|state| state.borrow_mut().draining = true);
    let _guard = DrainGuard;

    let mut ran = 0usize;
    // The borrow is released before each subscriber runs, so subscribers can
    // open batches and enqueue more work.
    while let Some(id) = BATCH.with(|state| state.borrow_mut().pop()) {
        if let Some(subscriber) = Runtime::subscriber(id) {
            subscriber.notify();
            ran += 1;
        }
    }

    tracing::trace!(ran, "batch drained");
}

/// Queue a subscriber on the current batch.
///
/// Outside any batch the subscriber stays queued until the next batch closes,
/// so callers should only enqueue from inside [`batch`].
pub(crate) fn enqueue(id: SubscriberId) {
    BATCH.with(|state| {
        state.borrow_mut().push(id);
    });
}

/// Run `f` as one transaction.
///
/// Every subscriber notified by writes inside `f` runs at most once, after
/// `f` returns and only when this is the outermost batch on the thread.
///
/// # Example
///
/// ```rust
/// use deepsignal_core::reactive::{batch, Signal};
///
/// let first = Signal::new(1);
/// let second = Signal::new(2);
///
/// batch(|| {
///     first.set(10);
///     second.set(20);
/// });
///
/// assert_eq!(first.peek() + second.peek(), 30);
/// ```
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let guard = BatchGuard::open();
    let result = f();
    drop(guard);
    result
}

/// Whether writes on this thread are currently being coalesced.
pub fn is_batching() -> bool {
    BATCH.with(|state| {
        let state = state.borrow();
        state.depth > 0 || state.draining
    })
}
