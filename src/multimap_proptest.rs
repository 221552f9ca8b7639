#![cfg(test)]

// Property tests for OrderedSetMultimap kept inside the crate so they can
// be extended with internal checks without feature gates.

use crate::OrderedSetMultimap;
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;

// Reference model: the global order is literally the list of successful
// insertions, and every other ordering is derivable from it plus the key
// first-insertion list.
#[derive(Default)]
struct Model {
    pairs: Vec<(String, i32)>,
    key_order: Vec<String>,
}

impl Model {
    fn insert(&mut self, key: &str, value: i32) -> bool {
        if self.pairs.iter().any(|(k, v)| k == key && *v == value) {
            return false;
        }
        self.pairs.push((key.to_string(), value));
        if !self.key_order.iter().any(|k| k == key) {
            self.key_order.push(key.to_string());
        }
        true
    }

    fn remove(&mut self, key: &str, value: i32) -> bool {
        let Some(pos) = self
            .pairs
            .iter()
            .position(|(k, v)| k == key && *v == value)
        else {
            return false;
        };
        self.pairs.remove(pos);
        self.drop_key_if_empty(key);
        true
    }

    fn remove_all(&mut self, key: &str) -> Vec<i32> {
        let old = self.values_of(key);
        self.pairs.retain(|(k, _)| k != key);
        self.key_order.retain(|k| k != key);
        old
    }

    fn replace_values(&mut self, key: &str, values: &[i32]) -> Vec<i32> {
        let old = self.values_of(key);
        let had_key = !old.is_empty();
        self.pairs.retain(|(k, _)| k != key);
        let mut fresh: Vec<i32> = Vec::new();
        for &v in values {
            if !fresh.contains(&v) {
                fresh.push(v);
            }
        }
        for &v in &fresh {
            self.pairs.push((key.to_string(), v));
        }
        if fresh.is_empty() {
            self.key_order.retain(|k| k != key);
        } else if !had_key {
            self.key_order.push(key.to_string());
        }
        old
    }

    fn values_of(&self, key: &str) -> Vec<i32> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| *v)
            .collect()
    }

    fn drop_key_if_empty(&mut self, key: &str) {
        if !self.pairs.iter().any(|(k, _)| k == key) {
            self.key_order.retain(|k| k != key);
        }
    }
}

// Pool-indexed operations so shrinking moves toward earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize, i32),
    RemoveAll(usize),
    ReplaceValues(usize, Vec<i32>),
    Contains(usize, i32),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{1,3}", 1..=5).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let val = -3..6i32;
        let op = prop_oneof![
            4 => (idx.clone(), val.clone()).prop_map(|(i, v)| Op::Insert(i, v)),
            3 => (idx.clone(), val.clone()).prop_map(|(i, v)| Op::Remove(i, v)),
            1 => idx.clone().prop_map(Op::RemoveAll),
            1 => (idx.clone(), proptest::collection::vec(val.clone(), 0..5))
                .prop_map(|(i, vs)| Op::ReplaceValues(i, vs)),
            2 => (idx.clone(), val).prop_map(|(i, v)| Op::Contains(i, v)),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn check_against_model<S>(
    sut: &OrderedSetMultimap<String, i32, S>,
    model: &Model,
    pool: &[String],
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    // Global order equals the chronological insert sequence.
    let got: Vec<(String, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
    prop_assert_eq!(&got, &model.pairs);

    // Values in global order.
    let vals: Vec<i32> = sut.values().copied().collect();
    let want_vals: Vec<i32> = model.pairs.iter().map(|(_, v)| *v).collect();
    prop_assert_eq!(vals, want_vals);

    // Key first-insertion order.
    let keys: Vec<String> = sut.keys().cloned().collect();
    prop_assert_eq!(&keys, &model.key_order);

    // Per-key views: order, membership, no duplicates.
    for key in pool {
        let want = model.values_of(key);
        let view = sut.get(key.as_str());
        prop_assert_eq!(view.len(), want.len());
        let got: Vec<i32> = view.iter().copied().collect();
        prop_assert_eq!(&got, &want);
        for v in &want {
            prop_assert!(view.contains(v));
            prop_assert!(sut.contains(key.as_str(), v));
        }
        prop_assert_eq!(sut.contains_key(key.as_str()), !want.is_empty());
    }

    // Group view mirrors key order and per-key order.
    let grouped: Vec<(String, Vec<i32>)> = sut
        .groups()
        .map(|(k, vs)| (k.clone(), vs.iter().copied().collect()))
        .collect();
    let want_grouped: Vec<(String, Vec<i32>)> = model
        .key_order
        .iter()
        .map(|k| (k.clone(), model.values_of(k)))
        .collect();
    prop_assert_eq!(grouped, want_grouped);

    prop_assert_eq!(sut.len(), model.pairs.len());
    prop_assert_eq!(sut.is_empty(), model.pairs.is_empty());
    prop_assert_eq!(sut.keys_len(), model.key_order.len());
    Ok(())
}

fn run_scenario<S>(pool: Vec<String>, ops: Vec<Op>, hasher: S) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut sut: OrderedSetMultimap<String, i32, S> =
        OrderedSetMultimap::with_capacity_and_hasher(4, 2, hasher);
    let mut model = Model::default();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let key = &pool[i];
                let expected = model.insert(key, v);
                prop_assert_eq!(sut.insert(key.clone(), v), expected);
            }
            Op::Remove(i, v) => {
                let key = &pool[i];
                let expected = model.remove(key, v);
                prop_assert_eq!(sut.remove(key.as_str(), &v), expected);
            }
            Op::RemoveAll(i) => {
                let key = &pool[i];
                let expected = model.remove_all(key);
                prop_assert_eq!(sut.remove_all(key.as_str()), expected);
            }
            Op::ReplaceValues(i, vs) => {
                let key = &pool[i];
                let expected = model.replace_values(key, &vs);
                prop_assert_eq!(sut.replace_values(key.clone(), vs), expected);
            }
            Op::Contains(i, v) => {
                let key = &pool[i];
                let expected = model.pairs.iter().any(|(k, mv)| k == key && *mv == v);
                prop_assert_eq!(sut.contains(key.as_str(), &v), expected);
            }
            Op::Clear => {
                sut.clear();
                model = Model::default();
            }
        }
        check_against_model(&sut, &model, &pool)?;
    }
    Ok(())
}

// Property: state-machine equivalence against the flat reference model,
// exercising every ordering invariant after every operation:
// - global order == chronological successful inserts (duplicates skipped),
// - key order == first-insertion order, with the re-added-key-goes-last
//   quirk falling out of the model the same way,
// - per-key order == global order filtered to that key,
// - len/keys_len/contains parity throughout.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(pool, ops, std::collections::hash_map::RandomState::new())?;
    }
}

// Collision variant: a constant hasher forces every key into one index
// probe chain and every value of a set into one bucket, stressing chain
// splicing and the equality fallback.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(pool, ops, ConstBuildHasher)?;
    }
}
