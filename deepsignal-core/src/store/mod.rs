//! Deep Signals
//!
//! A [`DeepSignal`] turns a nested [`Value::Object`] into a tree whose leaves
//! are [`Signal`]s and whose branches are further `DeepSignal`s. Each branch
//! keeps the original object shape for navigation and carries a private
//! *structure cell* that changes only when the branch's key set changes.
//!
//! That split gives two granularities of subscription:
//!
//! - Reading a leaf signal re-runs the reader whenever that leaf changes.
//! - Reading a branch through [`DeepSignal::value`] re-runs the reader when
//!   the branch (or any branch below it) gains or loses a key, and when any
//!   leaf it projected changes.
//!
//! # Writes
//!
//! [`DeepSignal::set_value`] diffs a new payload against the tree inside one
//! [`batch`](crate::reactive::batch): existing leaves are overwritten,
//! existing branches are diffed recursively, new keys become new children,
//! and keys missing from the payload are cleared and removed.
//!
//! A leaf stays a leaf forever. Writing an object into a leaf stores the
//! object opaquely; per-field reactivity for it only appears if the parent
//! later drops the key and re-adds it.
//!
//! # Example
//!
//! ```rust
//! use deepsignal_core::{deep_signal, reactive::Effect};
//! use serde_json::json;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let store = deep_signal(json!({ "record": {} })).unwrap();
//!
//! let shape_runs = Arc::new(AtomicUsize::new(0));
//! let _watch = {
//!     let (store, runs) = (store.clone(), shape_runs.clone());
//!     Effect::new(move || {
//!         store.value();
//!         runs.fetch_add(1, Ordering::SeqCst);
//!     })
//! };
//!
//! let record = store.branch("record").unwrap();
//! record.set_value(json!({ "foo": { "name": "Foo" } })).unwrap();
//!
//! assert_eq!(store.peek()["record"]["foo"]["name"].as_str(), Some("Foo"));
//! assert_eq!(shape_runs.load(Ordering::SeqCst), 2);
//! ```

mod builder;
mod read;
mod write;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::Result;
use crate::reactive::Signal;
use crate::value::{Object, Value};

use self::read::Tracking;

/// Keys a payload may not use at any depth.
pub const RESERVED_KEYS: [&str; 2] = ["value", "peek"];

/// Whether `key` collides with a node accessor.
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Build a store from a plain payload.
///
/// Shorthand for [`DeepSignal::new`].
pub fn deep_signal(payload: impl Into<Value>) -> Result<DeepSignal> {
    DeepSignal::new(payload)
}

struct NodeInner {
    children: RwLock<IndexMap<String, Child>>,
    /// Last payload that changed this node's shape. Read only for tracking.
    structure: Signal<Value>,
}

/// One level of a reactive tree.
///
/// Cloning yields another handle to the same node.
#[derive(Clone)]
pub struct DeepSignal {
    inner: Arc<NodeInner>,
}

/// A position in the tree: either a leaf signal or a nested node.
#[derive(Clone, Debug)]
pub enum Child {
    Leaf(Signal<Value>),
    Branch(DeepSignal),
}

impl DeepSignal {
    /// Build a tree from `payload`.
    ///
    /// Objects become branches, every other value becomes a leaf, and
    /// function values are called once and their result stored in a leaf.
    /// A non-object payload yields an empty node.
    ///
    /// Fails with [`StoreError::ReservedKey`](crate::StoreError::ReservedKey)
    /// if any key at any depth is reserved; no signal is created in that case.
    pub fn new(payload: impl Into<Value>) -> Result<Self> {
        builder::build(payload.into())
    }

    /// Build a tree from the payload returned by `factory`.
    pub fn from_fn<F, V>(factory: F) -> Result<Self>
    where
        F: FnOnce() -> V,
        V: Into<Value>,
    {
        Self::new(factory())
    }

    /// Tracked snapshot of the whole subtree.
    ///
    /// Inside an effect this subscribes to this node's shape, the shape of
    /// every node below it, and every leaf it reads.
    pub fn value(&self) -> Object {
        read::project(self, Tracking::Tracked)
    }

    /// Untracked snapshot of the whole subtree.
    pub fn peek(&self) -> Object {
        read::project(self, Tracking::Untracked)
    }

    /// Apply `payload` to this subtree in a single batch.
    ///
    /// On error nothing has been written.
    pub fn set_value(&self, payload: impl Into<Value>) -> Result<()> {
        write::write(self, payload.into())
    }

    /// Compute the next payload from an untracked snapshot and apply it.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&Object) -> Value,
    {
        let next = f(&self.peek());
        self.set_value(next)
    }

    /// The child stored under `key`.
    pub fn get(&self, key: &str) -> Option<Child> {
        self.inner.children.read().get(key).cloned()
    }

    /// The leaf signal stored under `key`, if that child is a leaf.
    pub fn leaf(&self, key: &str) -> Option<Signal<Value>> {
        self.get(key).and_then(Child::into_leaf)
    }

    /// The node stored under `key`, if that child is a branch.
    pub fn branch(&self, key: &str) -> Option<DeepSignal> {
        self.get(key).and_then(Child::into_branch)
    }

    /// Walk `path` from this node. An empty path yields this node.
    pub fn at<I, S>(&self, path: I) -> Option<Child>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut current = Child::Branch(self.clone());
        for key in path {
            current = match current {
                Child::Branch(node) => node.get(key.as_ref())?,
                Child::Leaf(_) => return None,
            };
        }
        Some(current)
    }

    /// Current keys, subscribing only to this node's structure cell.
    ///
    /// Inside an effect this re-runs the effect when a write applied at or
    /// above this node changes the key set at or below it. Leaf writes never
    /// re-run it.
    pub fn tracked_keys(&self) -> Vec<String> {
        self.structure().track();
        self.keys()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.children.read().contains_key(key)
    }

    /// Current keys, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.children.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.children.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.children.read().is_empty()
    }

    /// Whether two handles point at the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn from_parts(children: IndexMap<String, Child>, payload: Value) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                children: RwLock::new(children),
                structure: Signal::new(payload),
            }),
        }
    }

    fn structure(&self) -> &Signal<Value> {
        &self.inner.structure
    }

    /// Handles to every child, taken under a short read lock.
    fn children(&self) -> Vec<(String, Child)> {
        self.inner
            .children
            .read()
            .iter()
            .map(|(key, child)| (key.clone(), child.clone()))
            .collect()
    }

    fn insert_child(&self, key: String, child: Child) {
        self.inner.children.write().insert(key, child);
    }

    fn remove_child(&self, key: &str) -> Option<Child> {
        self.inner.children.write().shift_remove(key)
    }
}

impl fmt::Debug for DeepSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSignal")
            .field("keys", &self.keys())
            .field("structure_id", &self.inner.structure.id())
            .finish()
    }
}

impl Child {
    /// Tracked read: the leaf's value, or a tracked snapshot of the branch.
    pub fn value(&self) -> Value {
        match self {
            Child::Leaf(signal) => signal.get(),
            Child::Branch(node) => Value::Object(node.value()),
        }
    }

    /// Untracked read.
    pub fn peek(&self) -> Value {
        match self {
            Child::Leaf(signal) => signal.peek(),
            Child::Branch(node) => Value::Object(node.peek()),
        }
    }

    /// Write through to the leaf, or structurally apply to the branch.
    pub fn set_value(&self, value: impl Into<Value>) -> Result<()> {
        match self {
            Child::Leaf(signal) => {
                signal.set(value.into());
                Ok(())
            }
            Child::Branch(node) => node.set_value(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Child::Leaf(_))
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Child::Branch(_))
    }

    pub fn as_leaf(&self) -> Option<&Signal<Value>> {
        match self {
            Child::Leaf(signal) => Some(signal),
            Child::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&DeepSignal> {
        match self {
            Child::Branch(node) => Some(node),
            Child::Leaf(_) => None,
        }
    }

    pub fn into_leaf(self) -> Option<Signal<Value>> {
        match self {
            Child::Leaf(signal) => Some(signal),
            Child::Branch(_) => None,
        }
    }

    pub fn into_branch(self) -> Option<DeepSignal> {
        match self {
            Child::Branch(node) => Some(node),
            Child::Leaf(_) => None,
        }
    }
}
