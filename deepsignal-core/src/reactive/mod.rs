//! Reactive Primitives
//!
//! This module implements the reactive cell the store is built on: signals,
//! effects, and batched transactions.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (an effect), the signal automatically registers
//! that context as a dependent. When the signal's value changes, all
//! dependents are notified.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change. Effects are how callers observe the store: render
//! functions, loggers, and derived writes.
//!
//! ## Batches
//!
//! A batch groups many writes into one notification round, so a computation
//! never sees a half-applied update and runs at most once per batch.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to automatically
//! detect dependencies. When a signal is read, we check if there is an active
//! tracking context and, if so, record the dependency.

mod batch;
mod context;
mod effect;
mod runtime;
mod signal;
mod subscriber;

pub use batch::{batch, is_batching};
pub use context::{untrack, Dependencies, ReactiveContext};
pub use effect::Effect;
pub use runtime::{ReactiveHandle, Runtime};
pub use signal::Signal;
pub use subscriber::{Subscriber, SubscriberId};
