//! Bulk set algebra: lock-step merge, difference, intersection, filter.

use crate::{BulkChangeEvent, Trie};

fn trie_of<const N: usize>(pairs: [(u32, &'static str); N]) -> Trie<u32, &'static str> {
    pairs.into_iter().collect()
}

// ---------------------------------------------------------------------------
// put_all
// ---------------------------------------------------------------------------

#[test]
fn put_all_overlapping() {
    let mut a = trie_of([(1, "x"), (2, "y")]);
    let b = trie_of([(2, "z"), (3, "w")]);

    let bulk = a.put_all(&b);

    assert_eq!(a, trie_of([(1, "x"), (2, "z"), (3, "w")]));
    assert_eq!(
        bulk,
        BulkChangeEvent {
            in_both: 1,
            removed: 0,
            replaced: true,
        }
    );
    assert_eq!(a.len(), 3);
}

#[test]
fn put_all_with_self_equal_is_identity() {
    let a_pairs: Vec<(u64, u64)> = (0..200).map(|i| (i, i * 3)).collect();
    let mut a: Trie<u64, u64> = a_pairs.iter().copied().collect();
    let b: Trie<u64, u64> = a_pairs.iter().copied().collect();

    let bulk = a.put_all(&b);

    assert_eq!(bulk.in_both, 200);
    assert!(!bulk.replaced);
    assert_eq!(a.len(), 200);
    assert_eq!(a, b);
}

#[test]
fn put_all_disjoint_is_union() {
    let mut a: Trie<u64, u64> = (0..100).map(|i| (i, i)).collect();
    let b: Trie<u64, u64> = (100..250).map(|i| (i, i)).collect();

    let bulk = a.put_all(&b);

    assert_eq!(bulk.in_both, 0);
    assert!(!bulk.replaced);
    assert_eq!(a.len(), 250);
    for i in 0..250 {
        assert_eq!(a.get(&i), Some(&i));
    }
}

#[test]
fn put_all_into_empty_grafts() {
    let mut a: Trie<u64, u64> = Trie::new();
    let b: Trie<u64, u64> = (0..500).map(|i| (i, i * 2)).collect();

    let bulk = a.put_all(&b);

    assert_eq!(bulk, BulkChangeEvent::default());
    assert_eq!(a, b);
}

#[test]
fn put_all_with_combining_update() {
    let mut a: Trie<&str, i32> = [("x", 1), ("y", 2)].into_iter().collect();
    let b: Trie<&str, i32> = [("y", 40), ("z", 5)].into_iter().collect();

    let bulk = a.put_all_with(&b, |ours, theirs| ours + theirs);

    assert_eq!(a.get(&"x"), Some(&1));
    assert_eq!(a.get(&"y"), Some(&42));
    assert_eq!(a.get(&"z"), Some(&5));
    assert_eq!(bulk.in_both, 1);
    assert!(bulk.replaced);
}

/// An update that keeps the receiver's value reports no replacement.
#[test]
fn put_all_keeping_ours_reports_unreplaced() {
    let mut a: Trie<&str, i32> = [("y", 2)].into_iter().collect();
    let b: Trie<&str, i32> = [("y", 40)].into_iter().collect();

    let bulk = a.put_all_with(&b, |ours, _theirs| *ours);

    assert_eq!(a.get(&"y"), Some(&2));
    assert_eq!(bulk.in_both, 1);
    assert!(!bulk.replaced);
}

// ---------------------------------------------------------------------------
// remove_all
// ---------------------------------------------------------------------------

#[test]
fn remove_all_self_empties() {
    let mut a: Trie<u64, u64> = (0..300).map(|i| (i, i)).collect();
    let b = a.iter().map(|(k, v)| (*k, *v)).collect();

    let bulk = a.remove_all(&b);

    assert!(a.is_empty());
    assert_eq!(bulk.removed, 300);
}

#[test]
fn remove_all_partial() {
    let mut a: Trie<u64, u64> = (0..100).map(|i| (i, i)).collect();
    let b: Trie<u64, u64> = (50..150).map(|i| (i, i + 7)).collect();

    let bulk = a.remove_all(&b);

    assert_eq!(bulk.removed, 50);
    assert_eq!(a.len(), 50);
    for i in 0..50 {
        assert_eq!(a.get(&i), Some(&i));
    }
    for i in 50..100 {
        assert_eq!(a.get(&i), None);
    }
}

/// Matching is by key only — values in the other trie are ignored.
#[test]
fn remove_all_ignores_values() {
    let mut a = trie_of([(1, "keep"), (2, "drop")]);
    let b = trie_of([(2, "different value")]);

    let bulk = a.remove_all(&b);

    assert_eq!(bulk.removed, 1);
    assert_eq!(a.get(&1), Some(&"keep"));
    assert_eq!(a.get(&2), None);
}

#[test]
fn remove_all_disjoint_is_noop() {
    let mut a: Trie<u64, u64> = (0..50).map(|i| (i, i)).collect();
    let b: Trie<u64, u64> = (100..150).map(|i| (i, i)).collect();

    let bulk = a.remove_all(&b);

    assert_eq!(bulk.removed, 0);
    assert_eq!(a.len(), 50);
}

#[test]
fn remove_all_down_to_one_key() {
    let mut a: Trie<u64, u64> = (0..64).map(|i| (i, i)).collect();
    let b: Trie<u64, u64> = (0..63).map(|i| (i, i)).collect();

    a.remove_all(&b);

    assert_eq!(a.len(), 1);
    assert_eq!(a.get(&63), Some(&63));
    assert_eq!(a, [(63, 63)].into_iter().collect());
}

// ---------------------------------------------------------------------------
// retain_all
// ---------------------------------------------------------------------------

#[test]
fn retain_all_self_is_identity() {
    let mut a: Trie<u64, u64> = (0..200).map(|i| (i, i)).collect();
    let b = a.iter().map(|(k, v)| (*k, *v)).collect();

    let bulk = a.retain_all(&b);

    assert_eq!(bulk.removed, 0);
    assert_eq!(bulk.in_both, 200);
    assert_eq!(a.len(), 200);
}

/// Intersection keeps the receiver's values, not the argument's.
#[test]
fn retain_all_keeps_own_values() {
    let mut a = trie_of([(1, "a1"), (2, "a2"), (3, "a3")]);
    let b = trie_of([(2, "b2"), (3, "b3"), (4, "b4")]);

    let bulk = a.retain_all(&b);

    assert_eq!(a.len(), 2);
    assert_eq!(a.get(&1), None);
    assert_eq!(a.get(&2), Some(&"a2"));
    assert_eq!(a.get(&3), Some(&"a3"));
    assert_eq!(bulk.in_both, 2);
    assert_eq!(bulk.removed, 1);
}

#[test]
fn retain_all_with_empty_clears() {
    let mut a: Trie<u64, u64> = (0..100).map(|i| (i, i)).collect();
    let b: Trie<u64, u64> = Trie::new();

    let bulk = a.retain_all(&b);

    assert!(a.is_empty());
    assert_eq!(bulk.removed, 100);
}

#[test]
fn retain_all_disjoint_clears() {
    let mut a: Trie<u64, u64> = (0..100).map(|i| (i, i)).collect();
    let b: Trie<u64, u64> = (200..300).map(|i| (i, i)).collect();

    let bulk = a.retain_all(&b);

    assert!(a.is_empty());
    assert_eq!(bulk.removed, 100);
    assert_eq!(bulk.in_both, 0);
}

// ---------------------------------------------------------------------------
// filter_all
// ---------------------------------------------------------------------------

#[test]
fn filter_all_keeps_matching() {
    let mut a: Trie<u64, u64> = (0..100).map(|i| (i, i)).collect();

    let bulk = a.filter_all(|k, _v| k % 2 == 0);

    assert_eq!(bulk.removed, 50);
    assert_eq!(a.len(), 50);
    for i in 0..100 {
        assert_eq!(a.get(&i).is_some(), i % 2 == 0);
    }
}

#[test]
fn filter_all_keep_everything_is_noop() {
    let mut a: Trie<u64, u64> = (0..100).map(|i| (i, i)).collect();
    let before = a.checkpoint();

    let bulk = a.filter_all(|_k, _v| true);

    assert_eq!(bulk.removed, 0);
    assert_eq!(a.len(), 100);
    assert_eq!(a.iter_at(&before).count(), 100);
}

#[test]
fn filter_all_by_value() {
    let mut a = trie_of([(1, "keep"), (2, "drop"), (3, "keep")]);

    a.filter_all(|_k, v| *v == "keep");

    assert_eq!(a.len(), 2);
    assert_eq!(a.get(&2), None);
}

#[test]
fn filter_all_drop_everything() {
    let mut a: Trie<u64, u64> = (0..75).map(|i| (i, i)).collect();

    let bulk = a.filter_all(|_k, _v| false);

    assert!(a.is_empty());
    assert_eq!(bulk.removed, 75);
}

// ---------------------------------------------------------------------------
// mixed shapes
// ---------------------------------------------------------------------------

/// Bulk operations across tries of very different sizes exercise the
/// data-vs-subtree classification on both sides.
#[test]
fn bulk_asymmetric_sizes() {
    let big: Trie<u64, u64> = (0..1000).map(|i| (i, i)).collect();
    let small: Trie<u64, u64> = (500..510).map(|i| (i, i)).collect();

    let mut union = small.iter().map(|(k, v)| (*k, *v)).collect::<Trie<_, _>>();
    union.put_all(&big);
    assert_eq!(union.len(), 1000);

    let mut diff = big.iter().map(|(k, v)| (*k, *v)).collect::<Trie<_, _>>();
    let bulk = diff.remove_all(&small);
    assert_eq!(bulk.removed, 10);
    assert_eq!(diff.len(), 990);

    let mut inter = big.iter().map(|(k, v)| (*k, *v)).collect::<Trie<_, _>>();
    inter.retain_all(&small);
    assert_eq!(inter.len(), 10);
    assert_eq!(inter, small);
}
