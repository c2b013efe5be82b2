//! DeepSignal Core
//!
//! This crate turns plain nested state into a tree of fine-grained signals.
//! It implements:
//!
//! - Reactive primitives (signals, effects, batches)
//! - A plain value model with an explicit atomicity policy
//! - Deep signal trees with structural diffing on write
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Signals, effects, dependency tracking, and batching
//! - `value`: The plain data accepted and produced by stores
//! - `store`: Tree construction, structural writes, and projections
//! - `error`: The error type raised for reserved keys
//!
//! # Example
//!
//! ```rust
//! use deepsignal_core::{deep_signal, reactive::Effect, Value};
//! use serde_json::json;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let store = deep_signal(json!({ "count": 0 })).unwrap();
//! let count = store.leaf("count").unwrap();
//!
//! // Re-runs only when `count` changes.
//! let seen = Arc::new(AtomicUsize::new(0));
//! let _effect = {
//!     let (count, seen) = (count.clone(), seen.clone());
//!     Effect::new(move || {
//!         count.get();
//!         seen.fetch_add(1, Ordering::SeqCst);
//!     })
//! };
//!
//! for _ in 0..3 {
//!     count.update(|v| Value::from(v.as_f64().unwrap_or_default() + 1.0));
//! }
//!
//! assert_eq!(store.peek()["count"], Value::from(3));
//! assert_eq!(seen.load(Ordering::SeqCst), 4);
//! ```

pub mod error;
pub mod reactive;
pub mod store;
pub mod value;

pub use error::{Result, StoreError};
pub use store::{deep_signal, is_reserved, Child, DeepSignal, RESERVED_KEYS};
pub use value::{Func, Object, Value};
