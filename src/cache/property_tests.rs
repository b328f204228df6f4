//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check store behaviour over arbitrary operation sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheStore, CacheValue};

// == Strategies ==
/// Small key alphabet so sequences revisit the same keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Del { key: String },
    Incr { key: String, by: i32 },
    Expire { key: String },
    Unexpire { key: String },
    Flush,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Del { key }),
        2 => (key_strategy(), -100i32..100)
            .prop_map(|(key, by)| CacheOp::Incr { key, by }),
        2 => key_strategy().prop_map(|key| CacheOp::Expire { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Unexpire { key }),
        1 => Just(CacheOp::Flush),
    ]
}

fn apply(store: &mut CacheStore, op: &CacheOp) {
    match op {
        CacheOp::Set { key, value } => store.set(key, value.as_str()),
        CacheOp::Get { key } => {
            let _ = store.get(key);
        }
        CacheOp::Del { key } => store.del(key),
        CacheOp::Incr { key, by } => {
            let _ = store.incr(key, Some(&by.to_string()));
        }
        CacheOp::Expire { key } => {
            let _ = store.expire(key, "3600000");
        }
        CacheOp::Unexpire { key } => {
            store.unexpire(key);
        }
        CacheOp::Flush => store.flush(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing a value and reading it back returns the same value.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let mut store = CacheStore::new(None);

        store.set(&key, value.as_str());

        prop_assert_eq!(store.get(&key), Some(CacheValue::Text(value)));
    }

    // After DEL, a key is absent whatever happened before.
    #[test]
    fn prop_delete_removes_entry(ops in prop::collection::vec(cache_op_strategy(), 0..30), key in key_strategy()) {
        let mut store = CacheStore::new(None);
        for op in &ops {
            apply(&mut store, op);
        }

        store.del(&key);

        prop_assert_eq!(store.get(&key), None);
        prop_assert!(store.expiry(&key).is_none());
    }

    // A key with an expiry handle always has a value.
    #[test]
    fn prop_expiry_implies_value(
        ops in prop::collection::vec(cache_op_strategy(), 1..60),
        with_default in any::<bool>()
    ) {
        let default_expiry = with_default.then(|| Duration::from_secs(3600));
        let mut store = CacheStore::new(default_expiry);

        for op in &ops {
            apply(&mut store, op);
            for key in ["a", "b", "c", "d", "e", "aa", "ab", "ba", "ea"] {
                if store.expiry(key).is_some() {
                    prop_assert!(store.contains(key), "expiry without value for {}", key);
                }
            }
            prop_assert!(store.pending_expiries() <= store.len());
        }
    }

    // INCR/DECR on a fresh key sum their deltas from zero.
    #[test]
    fn prop_incr_accumulates(deltas in prop::collection::vec(-1000i64..1000, 1..20)) {
        let mut store = CacheStore::new(None);
        let mut expected = 0i64;

        for delta in &deltas {
            expected += delta;
            let result = if *delta >= 0 {
                store.incr("counter", Some(&delta.to_string()))
            } else {
                store.decr("counter", Some(&(-delta).to_string()))
            };
            prop_assert_eq!(result.unwrap(), expected);
        }

        prop_assert_eq!(store.get("counter"), Some(CacheValue::Integer(expected)));
    }

    // A failed INCR never changes the stored value.
    #[test]
    fn prop_failed_incr_is_side_effect_free(value in "[a-z]{1,8}", by in "[0-9]{0,3}") {
        let mut store = CacheStore::new(None);
        store.set("k", value.as_str());

        prop_assert!(store.incr("k", Some(&by)).is_err());
        prop_assert_eq!(store.get("k"), Some(CacheValue::Text(value)));
    }

    // RANDOM picks a present key, or nothing when empty.
    #[test]
    fn prop_random_returns_present_key(entries in prop::collection::hash_map(key_strategy(), value_strategy(), 0..10)) {
        let mut store = CacheStore::new(None);
        for (key, value) in &entries {
            store.set(key, value.as_str());
        }

        match store.random() {
            Some(key) => prop_assert!(store.keys().contains(&key)),
            None => prop_assert!(entries.is_empty()),
        }
    }

    // The snapshot matches a model map maintained alongside the store.
    #[test]
    fn prop_snapshot_matches_model(ops in prop::collection::vec(cache_op_strategy(), 0..60)) {
        let mut store = CacheStore::new(None);
        let mut model: HashMap<String, CacheValue> = HashMap::new();

        for op in &ops {
            match op {
                CacheOp::Set { key, value } => {
                    model.insert(key.clone(), CacheValue::Text(value.clone()));
                }
                CacheOp::Del { key } => {
                    model.remove(key);
                }
                CacheOp::Incr { key, by } => {
                    let current = match model.get(key) {
                        None => Some(0),
                        Some(value) => value.as_integer(),
                    };
                    if let Some(current) = current {
                        model.insert(key.clone(), CacheValue::Integer(current + *by as i64));
                    }
                }
                CacheOp::Flush => model.clear(),
                CacheOp::Get { .. } | CacheOp::Expire { .. } | CacheOp::Unexpire { .. } => {}
            }
            apply(&mut store, op);
        }

        prop_assert_eq!(store.snapshot(), model);
    }
}

// Property test for concurrent access through the shared handle
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Concurrent writers and readers only ever observe complete values.
    #[test]
    fn prop_concurrent_operation_correctness(
        initial_entries in prop::collection::vec((key_strategy(), value_strategy()), 1..20),
        operations in prop::collection::vec(cache_op_strategy(), 10..50)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let store = crate::cache::shared(CacheStore::new(None));

            {
                let mut cache = store.write().await;
                for (key, value) in &initial_entries {
                    cache.set(key, value.as_str());
                }
            }

            let mut handles = vec![];
            for op in operations {
                let store = store.clone();
                handles.push(tokio::spawn(async move {
                    let mut cache = store.write().await;
                    if let CacheOp::Get { key } = &op {
                        if let Some(CacheValue::Text(value)) = cache.get(key) {
                            if value.len() > 32 {
                                return Err(format!("Corrupted value for '{}'", key));
                            }
                        }
                    } else {
                        apply(&mut cache, &op);
                    }
                    Ok::<_, String>(())
                }));
            }

            for handle in handles {
                let result = handle.await.expect("Task should not panic");
                prop_assert!(result.is_ok(), "Concurrent operation failed: {:?}", result);
            }

            let cache = store.read().await;
            prop_assert!(cache.pending_expiries() <= cache.len());
            Ok(())
        })?;
    }
}
