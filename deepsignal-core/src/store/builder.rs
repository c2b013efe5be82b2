//! Tree construction and key validation.

use indexmap::IndexMap;

use super::{is_reserved, Child, DeepSignal};
use crate::error::{Result, StoreError};
use crate::reactive::{untrack, Signal};
use crate::value::Value;

/// Validate `payload`, then build a node for it.
pub(super) fn build(payload: Value) -> Result<DeepSignal> {
    check_node(&payload, &mut Vec::new())?;
    Ok(build_node(&payload))
}

/// Reject `key` if it is reserved. `path` locates the parent node.
pub(super) fn check_key(key: &str, path: &[&str]) -> Result<()> {
    if is_reserved(key) {
        let err = StoreError::reserved_key(key, path);
        tracing::warn!(%err, "rejected payload");
        return Err(err);
    }
    Ok(())
}

/// Validate every key a fresh node built from `payload` would contain.
///
/// Factory results are never inspected: they always land in a leaf.
pub(super) fn check_node<'a>(payload: &'a Value, path: &mut Vec<&'a str>) -> Result<()> {
    let Some(entries) = payload.as_object() else {
        return Ok(());
    };

    for (key, value) in entries {
        check_key(key, path.as_slice())?;
        if value.is_object() {
            path.push(key);
            check_node(value, path)?;
            path.pop();
        }
    }
    Ok(())
}

/// Build a node for an already validated payload.
///
/// The structure cell starts out holding the payload itself.
pub(super) fn build_node(payload: &Value) -> DeepSignal {
    let children: IndexMap<String, Child> = payload
        .as_object()
        .map(|entries| {
            entries
                .iter()
                .map(|(key, value)| (key.clone(), build_child(value)))
                .collect()
        })
        .unwrap_or_default();

    DeepSignal::from_parts(children, payload.clone())
}

/// Build the child for one payload entry.
pub(super) fn build_child(value: &Value) -> Child {
    match value {
        // Factories run once, outside any caller's tracking.
        Value::Function(factory) => Child::Leaf(Signal::new(untrack(|| factory.call()))),
        Value::Object(_) => Child::Branch(build_node(value)),
        atomic => Child::Leaf(Signal::new(atomic.clone())),
    }
}
