//! Structural writes.
//!
//! A write validates the whole payload first and only then mutates, all inside
//! one batch. Leaf updates never touch a structure cell; a structure cell is
//! written exactly when its node gained or lost a key, directly or through a
//! descendant.

use super::builder::{build_child, check_key, check_node};
use super::{Child, DeepSignal};
use crate::error::Result;
use crate::reactive::batch;
use crate::value::{Object, Value};

/// Validate and apply `payload` to `node`.
pub(super) fn write(node: &DeepSignal, payload: Value) -> Result<()> {
    check_write(node, &payload, &mut Vec::new())?;

    let changed = batch(|| apply(node, &payload));
    tracing::debug!(kind = payload.kind(), changed, "structural write");
    Ok(())
}

/// Check every key `payload` would add below `node`.
fn check_write<'a>(node: &DeepSignal, payload: &'a Value, path: &mut Vec<&'a str>) -> Result<()> {
    let Some(entries) = payload.as_object() else {
        return Ok(());
    };

    for (key, value) in entries {
        match node.get(key) {
            // Leaves take anything, opaquely.
            Some(Child::Leaf(_)) => {}
            Some(Child::Branch(child)) => {
                path.push(key);
                check_write(&child, value, path)?;
                path.pop();
            }
            None => {
                check_key(key, path.as_slice())?;
                if value.is_object() {
                    path.push(key);
                    check_node(value, path)?;
                    path.pop();
                }
            }
        }
    }
    Ok(())
}

/// Diff `payload` into `node`. Returns whether the key set of `node` or of
/// any node below it changed.
///
/// Must run inside a batch. A non-object payload is diffed as an empty object
/// but still recorded verbatim in the structure cell. The structure cell
/// notifies on every shape change, even when the recorded payload compares
/// equal to the previous one.
fn apply(node: &DeepSignal, payload: &Value) -> bool {
    let empty = Object::new();
    let entries = payload.as_object().unwrap_or(&empty);
    let mut changed = false;

    for (key, value) in entries {
        match node.get(key) {
            Some(Child::Leaf(signal)) => {
                signal.set(value.clone());
            }
            Some(Child::Branch(child)) => {
                changed |= apply(&child, value);
            }
            None => {
                tracing::trace!(key = %key, kind = value.kind(), "adding child");
                node.insert_child(key.clone(), build_child(value));
                changed = true;
            }
        }
    }

    let stale: Vec<String> = node
        .keys()
        .into_iter()
        .filter(|key| !entries.contains_key(key))
        .collect();

    for key in stale {
        if let Some(child) = node.get(&key) {
            clear(&child);
        }
        node.remove_child(&key);
        tracing::trace!(key = %key, "removed child");
        changed = true;
    }

    // The payload may equal a stale cell value while a descendant's key set
    // still moved, so the cell is notified unconditionally.
    if changed {
        node.structure().replace(payload.clone());
    }
    changed
}

/// Empty a child that is about to be detached, so anyone still holding its
/// signals sees it go away.
fn clear(child: &Child) {
    match child {
        Child::Leaf(signal) => {
            signal.set(Value::Undefined);
        }
        Child::Branch(node) => {
            apply(node, &Value::Object(Object::new()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Effect;
    use crate::store::deep_signal;
    use crate::StoreError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn structure_cell_moves_only_on_shape_changes() {
        let store = deep_signal(json!({ "record": { "hello": "world" } })).unwrap();
        let record = store.branch("record").unwrap();

        record.leaf("hello").unwrap().set(Value::from("foo"));
        assert_eq!(record.leaf("hello").unwrap().peek(), Value::from("foo"));
        assert_eq!(store.structure().peek()["record"]["hello"], Value::from("world"));

        let mut next = store.peek();
        if let Some(Value::Object(record)) = next.get_mut("record") {
            record.insert("bar".into(), Value::from("baz"));
        }
        store.set_value(next).unwrap();
        assert_eq!(store.structure().peek()["record"]["hello"], Value::from("foo"));

        assert!(record.contains_key("hello"));
        assert!(record.peek().contains_key("hello"));

        store.set_value(json!({ "record": { "bar": "qux" } })).unwrap();
        assert!(!record.contains_key("hello"));
        assert!(!record.peek().contains_key("hello"));
    }

    #[test]
    fn leaf_only_writes_report_no_change() {
        let store = deep_signal(json!({ "a": { "b": 1 }, "c": 2 })).unwrap();
        let before = store.structure().peek();

        let changed = batch(|| apply(&store, &Value::from(json!({ "a": { "b": 5 }, "c": 6 }))));
        assert!(!changed);
        assert_eq!(store.structure().peek(), before);
        assert_eq!(store.peek()["a"]["b"], Value::from(5));
    }

    #[test]
    fn nested_shape_changes_propagate_up() {
        let store = deep_signal(json!({ "a": { "b": { "c": 1 } } })).unwrap();
        let payload = Value::from(json!({ "a": { "b": { "c": 1, "d": 2 } } }));

        let changed = batch(|| apply(&store, &payload));
        assert!(changed);
        assert_eq!(store.structure().peek(), payload);
        assert_eq!(
            store.branch("a").unwrap().structure().peek(),
            payload["a"].clone()
        );
    }

    #[test]
    fn removal_clears_detached_cells() {
        let store = deep_signal(json!({
            "record": {
                "foo": { "name": "Foo" },
                "bar": { "name": "Bar" },
                "baz": { "name": "Baz" }
            }
        }))
        .unwrap();
        let record = store.branch("record").unwrap();
        let bar = record.branch("bar").unwrap();
        let bar_name = bar.leaf("name").unwrap();

        let mut next = record.peek();
        next.shift_remove("bar");
        record.set_value(next).unwrap();

        assert!(record.get("bar").is_none());
        assert!(bar_name.peek().is_undefined());
        assert!(bar.is_empty());
        assert_eq!(bar.structure().peek(), Value::Object(Object::new()));
        assert_eq!(record.keys(), ["foo", "baz"]);
    }

    #[test]
    fn shape_change_under_an_equal_payload_still_notifies() {
        let store = deep_signal(json!({ "a": { "x": 1 } })).unwrap();
        let grown = json!({ "a": { "x": 1, "y": 1 } });
        store.set_value(grown.clone()).unwrap();

        let runs = Arc::new(AtomicUsize::new(0));
        let _effect = {
            let (store, runs) = (store.clone(), runs.clone());
            Effect::new(move || {
                store.structure().track();
                runs.fetch_add(1, Ordering::SeqCst);
            })
        };

        // Only `a`'s cell moves; the root keeps the grown payload.
        store.branch("a").unwrap().set_value(json!({ "x": 1 })).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        let changed = batch(|| apply(&store, &Value::from(grown.clone())));
        assert!(changed);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(store.branch("a").unwrap().contains_key("y"));
    }

    #[test]
    fn new_keys_are_built_like_the_builder_does() {
        let store = deep_signal(json!({ "record": {} })).unwrap();
        let record = store.branch("record").unwrap();

        record
            .set_value(json!({ "foo": { "name": "Foo" }, "tags": ["a"] }))
            .unwrap();

        let foo = record.branch("foo").unwrap();
        assert!(foo.get("name").unwrap().is_leaf());
        assert!(record.get("tags").unwrap().is_leaf());
    }

    #[test]
    fn leaves_are_never_promoted() {
        let store = deep_signal(json!({ "slot": 1 })).unwrap();
        store.set_value(json!({ "slot": { "nested": true } })).unwrap();

        let slot = store.get("slot").unwrap();
        assert!(slot.is_leaf());
        assert_eq!(slot.peek()["nested"], Value::Bool(true));
    }

    #[test]
    fn non_object_payload_empties_a_branch() {
        let store = deep_signal(json!({ "a": { "b": 1 } })).unwrap();
        let a = store.branch("a").unwrap();

        a.set_value(7).unwrap();
        assert!(a.is_empty());
        assert_eq!(a.structure().peek(), Value::from(7));
        assert!(store.branch("a").is_some());
    }

    #[test]
    fn rejected_writes_leave_the_tree_untouched() {
        let store = deep_signal(json!({ "a": 1, "nested": { "x": 1 } })).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let _effect = {
            let (store, runs) = (store.clone(), runs.clone());
            Effect::new(move || {
                store.value();
                runs.fetch_add(1, Ordering::SeqCst);
            })
        };

        let err = store
            .set_value(json!({ "a": 2, "nested": { "x": 2, "fresh": { "value": 0 } } }))
            .unwrap_err();

        assert_eq!(
            err,
            StoreError::ReservedKey {
                key: "value".into(),
                path: "nested.fresh".into()
            }
        );
        assert_eq!(Value::Object(store.peek()), Value::from(json!({ "a": 1, "nested": { "x": 1 } })));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn leaf_holding_a_reserved_looking_object_is_accepted() {
        let store = deep_signal(json!({ "slot": 0 })).unwrap();
        store.set_value(json!({ "slot": { "peek": 1 } })).unwrap();
        assert_eq!(store.peek()["slot"]["peek"], Value::from(1));
    }

    #[test]
    fn factories_in_writes_run_for_new_keys() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = deep_signal(json!({})).unwrap();

        let factory = {
            let calls = calls.clone();
            Value::function(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Value::from(10)
            })
        };
        let payload: Value = [("lazy", factory)].into_iter().collect();

        store.set_value(payload).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.leaf("lazy").unwrap().peek(), Value::from(10));
    }
}
