// OrderedSetMultimap behavioral test suite.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Set semantics: no duplicate (key, value) pair; duplicate insert is a
//   no-op returning false.
// - Key order: keys iterate in first-insertion order; an emptied and
//   re-added key moves to the end (deliberate quirk, preserved).
// - Per-key order: values of one key iterate in value-insertion order.
// - Global order: all pairs iterate in the chronological order of
//   successful insertions.
// - Growth: per-key tables double without disturbing any ordering.
use ordered_set_multimap::OrderedSetMultimap;

// Test: the worked end-to-end scenario.
// Verifies: key order survives partial removal, per-key view reflects the
// remaining values, global order closes over the removed pair.
#[test]
fn mixed_insert_remove_scenario() {
    let mut map = OrderedSetMultimap::new();
    assert!(map.insert("a", 1));
    assert!(map.insert("b", 2));
    assert!(map.insert("a", 2));
    assert!(!map.insert("a", 1)); // duplicate, no-op
    assert!(map.remove("a", &1));

    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(map.get("a").iter().copied().collect::<Vec<_>>(), vec![2]);
    assert_eq!(
        map.iter().map(|(&k, &v)| (k, v)).collect::<Vec<_>>(),
        vec![("b", 2), ("a", 2)]
    );
}

// Test: idempotent insert.
// Verifies: inserting a pair twice leaves size and every iteration order
// identical to inserting it once; the second call reports false.
#[test]
fn insert_is_idempotent() {
    let mut once = OrderedSetMultimap::new();
    let mut twice = OrderedSetMultimap::new();
    for map in [&mut once, &mut twice] {
        map.insert("k", 1);
        map.insert("k", 2);
        map.insert("j", 1);
    }
    assert!(!twice.insert("k", 1));

    assert_eq!(once.len(), twice.len());
    assert_eq!(
        once.iter().collect::<Vec<_>>(),
        twice.iter().collect::<Vec<_>>()
    );
    assert_eq!(
        once.keys().collect::<Vec<_>>(),
        twice.keys().collect::<Vec<_>>()
    );
}

// Test: add-then-remove round trip.
// Assumes: content equality ignores internal table capacity.
// Verifies: the structure matches its pre-add state, except that a
// re-added key lands at the end of key order afterward.
#[test]
fn add_remove_round_trip_and_key_reorder() {
    let mut map = OrderedSetMultimap::new();
    map.insert("a", 1);
    map.insert("b", 2);

    map.insert("c", 3);
    assert!(map.remove("c", &3));
    assert_eq!(map.len(), 2);
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["a", "b"]);
    assert!(!map.contains_key("c"));

    // Empty out "a" and bring it back: it now iterates last.
    assert!(map.remove("a", &1));
    map.insert("a", 1);
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["b", "a"]);
    assert_eq!(
        map.iter().map(|(&k, &v)| (k, v)).collect::<Vec<_>>(),
        vec![("b", 2), ("a", 1)]
    );
}

// Test: global order equals the literal chronology of successful adds.
// Verifies: interleaving keys does not group entries; rejected duplicates
// leave no trace anywhere.
#[test]
fn entries_follow_insertion_chronology() {
    let mut map = OrderedSetMultimap::new();
    let script = [("x", 1), ("y", 1), ("x", 2), ("y", 1), ("z", 9), ("x", 1)];
    let mut expected = Vec::new();
    for (k, v) in script {
        if map.insert(k, v) {
            expected.push((k, v));
        }
    }
    assert_eq!(
        map.iter().map(|(&k, &v)| (k, v)).collect::<Vec<_>>(),
        expected
    );
    assert_eq!(
        map.values().copied().collect::<Vec<_>>(),
        expected.iter().map(|&(_, v)| v).collect::<Vec<_>>()
    );
}

// Test: growth under one key.
// Assumes: per-key tables start at capacity 2 and double at load factor
// 1.0, so 100 values force well over three doublings.
// Verifies: membership, per-key order, per-pair retrievability, and
// removability all survive the resizes.
#[test]
fn resize_preserves_content_and_order() {
    let mut map = OrderedSetMultimap::new();
    for v in 0..100 {
        assert!(map.insert("k", v));
    }
    assert_eq!(map.len(), 100);
    assert_eq!(
        map.get("k").iter().copied().collect::<Vec<_>>(),
        (0..100).collect::<Vec<_>>()
    );
    for v in 0..100 {
        assert!(map.contains("k", &v));
    }
    for v in (0..100).step_by(7) {
        assert!(map.remove("k", &v));
    }
    for v in 0..100 {
        assert_eq!(map.contains("k", &v), v % 7 != 0);
    }
}

// Test: capacity hints are hints only.
// Verifies: zero and large hints produce maps with identical behavior.
#[test]
fn capacity_hints_do_not_change_behavior() {
    let mut tight: OrderedSetMultimap<i32, i32> = OrderedSetMultimap::with_capacity(0, 0);
    let mut roomy: OrderedSetMultimap<i32, i32> = OrderedSetMultimap::with_capacity(1024, 64);
    for k in 0..20 {
        for v in 0..10 {
            assert!(tight.insert(k, v));
            assert!(roomy.insert(k, v));
        }
    }
    assert_eq!(tight, roomy);
    assert_eq!(
        tight.iter().collect::<Vec<_>>(),
        roomy.iter().collect::<Vec<_>>()
    );
}

// Test: replace_values ordering contract.
// Verifies: an existing key keeps its key-order slot while its fresh
// values come last in global order; the old values come back in per-key
// order; the replacement sequence is deduplicated.
#[test]
fn replace_values_keeps_key_position() {
    let mut map = OrderedSetMultimap::new();
    map.insert("a", 1);
    map.insert("b", 2);
    map.insert("a", 3);

    let old = map.replace_values("a", [10, 11, 10]);
    assert_eq!(old, vec![1, 3]);
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(
        map.iter().map(|(&k, &v)| (k, v)).collect::<Vec<_>>(),
        vec![("b", 2), ("a", 10), ("a", 11)]
    );
}

// Test: copy construction.
// Verifies: building from an iterator with duplicate pairs deduplicates,
// keeping the first occurrence of each pair in its original position.
#[test]
fn from_iterator_copy_semantics() {
    let source = vec![("a", 1), ("b", 1), ("a", 1), ("b", 2), ("a", 2), ("b", 1)];
    let map: OrderedSetMultimap<&str, i32> = source.into_iter().collect();
    assert_eq!(
        map.iter().map(|(&k, &v)| (k, v)).collect::<Vec<_>>(),
        vec![("a", 1), ("b", 1), ("b", 2), ("a", 2)]
    );
}

// Test: no duplicates under churn.
// Verifies: after a mixed workload, no per-key view yields the same value
// twice.
#[test]
fn no_duplicates_after_churn() {
    let mut map = OrderedSetMultimap::new();
    for round in 0..3 {
        for k in 0..5 {
            for v in 0..8 {
                map.insert(k, v);
            }
        }
        for k in 0..5 {
            map.remove(&k, &(round * 2));
        }
    }
    for k in 0..5 {
        let values: Vec<i32> = map.get(&k).iter().copied().collect();
        let mut sorted = values.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), values.len(), "key {k} has duplicate values");
    }
}

// Test: owned String keys with &str queries across the whole surface.
// Verifies: Borrow-based lookup on get/contains/remove/remove_all.
#[test]
fn borrowed_queries() {
    let mut map: OrderedSetMultimap<String, String> = OrderedSetMultimap::new();
    map.insert("fruit".to_string(), "apple".to_string());
    map.insert("fruit".to_string(), "pear".to_string());
    map.insert("veg".to_string(), "leek".to_string());

    assert!(map.contains_key("fruit"));
    assert!(map.contains("fruit", "pear"));
    assert_eq!(map.get("fruit").len(), 2);
    assert!(map.remove("fruit", "apple"));
    assert_eq!(map.remove_all("veg"), vec!["leek".to_string()]);
    assert_eq!(map.keys_len(), 1);
}

// Test: clear and reuse.
// Verifies: clear empties every view and the map accepts fresh data with
// correct ordering afterward.
#[test]
fn clear_resets_all_views() {
    let mut map = OrderedSetMultimap::new();
    map.insert(1, 1);
    map.insert(2, 2);
    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.keys_len(), 0);
    assert_eq!(map.iter().count(), 0);
    assert_eq!(map.values().count(), 0);
    assert_eq!(map.keys().count(), 0);
    assert!(map.get(&1).is_empty());

    map.insert(3, 3);
    map.insert(1, 1);
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![3, 1]);
}

// Test: Debug output groups values under their keys in order.
#[test]
fn debug_formatting() {
    let mut map = OrderedSetMultimap::new();
    map.insert("b", 2);
    map.insert("a", 1);
    map.insert("b", 3);
    assert_eq!(format!("{map:?}"), r#"{"b": {2, 3}, "a": {1}}"#);
}
