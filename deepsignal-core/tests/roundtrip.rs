//! Property tests for store projections.
//!
//! Any plain nested payload without functions or reserved keys comes back
//! unchanged from a fresh store, whether it was built or written.

use deepsignal_core::{deep_signal, is_reserved, Object, Value};
use proptest::prelude::*;

fn key() -> impl Strategy<Value = String> {
    "[a-z]{1,6}".prop_filter("reserved keys are rejected", |key| !is_reserved(key))
}

fn atomic() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1.0e6f64..1.0e6).prop_map(Value::Number),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        prop::collection::vec(any::<i32>().prop_map(Value::from), 0..4).prop_map(Value::Array),
    ]
}

fn payload() -> impl Strategy<Value = Object> {
    let node = atomic().prop_recursive(4, 48, 6, |inner| {
        prop::collection::vec((key(), inner), 0..6)
            .prop_map(|entries| Value::Object(entries.into_iter().collect()))
    });
    prop::collection::vec((key(), node), 0..6).prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #[test]
    fn built_stores_peek_their_payload(payload in payload()) {
        let store = deep_signal(Value::Object(payload.clone())).unwrap();
        prop_assert_eq!(store.peek(), payload);
    }

    #[test]
    fn writes_into_an_empty_store_peek_their_payload(payload in payload()) {
        let store = deep_signal(Value::Object(Object::new())).unwrap();
        store.set_value(Value::Object(payload.clone())).unwrap();
        prop_assert_eq!(store.peek(), payload);
    }

    #[test]
    fn leaf_only_rewrites_keep_the_shape(payload in payload()) {
        let store = deep_signal(Value::Object(payload.clone())).unwrap();
        let keys = store.keys();
        store.set_value(Value::Object(payload.clone())).unwrap();
        prop_assert_eq!(store.keys(), keys);
        prop_assert_eq!(store.peek(), payload);
    }
}
