//! Projection of a tree back into a plain object.

use super::{Child, DeepSignal};
use crate::value::{Object, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Tracking {
    /// Subscribe to every structure cell and leaf visited.
    Tracked,
    /// Read without subscribing.
    Untracked,
}

/// Build a fresh snapshot of `node`. Never mutates the tree.
pub(super) fn project(node: &DeepSignal, tracking: Tracking) -> Object {
    if tracking == Tracking::Tracked {
        node.structure().track();
    }

    node.children()
        .into_iter()
        .map(|(key, child)| {
            let value = match child {
                Child::Leaf(signal) => match tracking {
                    Tracking::Tracked => signal.get(),
                    Tracking::Untracked => signal.peek(),
                },
                Child::Branch(branch) => Value::Object(project(&branch, tracking)),
            };
            (key, value)
        })
        .collect()
}
