use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use bptree::RbTree;

const TEST_SIZE: usize = 5_000;

fn key_strategy() -> impl Strategy<Value = i64> {
    -2_000i64..2_000i64
}

#[derive(Debug, Clone)]
enum SetOp {
    Insert(i64),
    Remove(i64),
    Contains(i64),
}

fn set_op_strategy() -> impl Strategy<Value = SetOp> {
    prop_oneof![
        5 => key_strategy().prop_map(SetOp::Insert),
        3 => key_strategy().prop_map(SetOp::Remove),
        2 => key_strategy().prop_map(SetOp::Contains),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays a random sequence of operations on both RbTree and
    /// BTreeSet and asserts identical results at every step.
    #[test]
    fn set_ops_match_btreeset(ops in proptest::collection::vec(set_op_strategy(), TEST_SIZE)) {
        let mut rb: RbTree<i64> = RbTree::new();
        let mut model: BTreeSet<i64> = BTreeSet::new();

        for op in &ops {
            match op {
                SetOp::Insert(v) => {
                    prop_assert_eq!(rb.insert(*v), model.insert(*v), "insert({})", v);
                }
                SetOp::Remove(v) => {
                    prop_assert_eq!(rb.remove(v), model.take(v), "remove({})", v);
                }
                SetOp::Contains(v) => {
                    prop_assert_eq!(rb.contains(v), model.contains(v), "contains({})", v);
                }
            }
            prop_assert_eq!(rb.len(), model.len(), "len mismatch after {:?}", op);
        }
    }
}

#[test]
fn custom_comparator_reverses_extremes() {
    let mut rb = RbTree::with_comparator(|a: &i32, b: &i32| b < a);
    for v in [5, 2, 8, 1] {
        assert!(rb.insert(v));
    }
    assert!(rb.contains(&8));
    assert_eq!(rb.remove(&2), Some(2));
    assert_eq!(rb.len(), 3);
}

#[test]
fn sequential_fill_and_drain() {
    let mut rb = RbTree::new();
    for v in 0..1_000 {
        assert!(rb.insert(v));
    }
    assert_eq!(rb.len(), 1_000);
    for v in 0..1_000 {
        assert_eq!(rb.remove(&v), Some(v));
    }
    assert!(rb.is_empty());
    assert_eq!(rb.remove(&0), None);
}
