//! Iteration completeness: forward visits every entry exactly once,
//! reverse visits the same entries in exactly reverse order.

use std::collections::HashSet;

use super::collision::CollidingKey;
use crate::Trie;

#[test]
fn empty_iteration() {
    let trie: Trie<i32, i32> = Trie::new();
    assert_eq!(trie.iter().next(), None);
    assert_eq!(trie.iter_rev().next(), None);
}

#[test]
fn single_entry() {
    let mut trie = Trie::new();
    trie.insert("only", 1);
    assert_eq!(trie.iter().collect::<Vec<_>>(), vec![(&"only", &1)]);
    assert_eq!(trie.iter_rev().collect::<Vec<_>>(), vec![(&"only", &1)]);
}

#[test]
fn forward_visits_each_exactly_once() {
    let mut trie = Trie::new();
    for i in 0_u64..500 {
        trie.insert(i, i * 2);
    }

    let seen: Vec<u64> = trie.iter().map(|(k, _)| *k).collect();
    assert_eq!(seen.len(), 500);

    let unique: HashSet<u64> = seen.iter().copied().collect();
    assert_eq!(unique.len(), 500);
    assert!(unique.iter().all(|&k| k < 500));
}

#[test]
fn reverse_is_exact_reverse_of_forward() {
    let mut trie = Trie::new();
    for i in 0_u64..300 {
        trie.insert(i, i);
    }

    let forward: Vec<(&u64, &u64)> = trie.iter().collect();
    let mut reverse: Vec<(&u64, &u64)> = trie.iter_rev().collect();
    reverse.reverse();
    assert_eq!(forward, reverse);
}

#[test]
fn exact_size_counts_down() {
    let mut trie = Trie::new();
    for i in 0_u32..10 {
        trie.insert(i, i);
    }

    let mut it = trie.iter();
    assert_eq!(it.len(), 10);
    it.next();
    it.next();
    assert_eq!(it.len(), 8);
    assert_eq!(it.by_ref().count(), 8);
    assert_eq!(it.next(), None);
}

/// Collision nodes must surface all their entries in both directions.
#[test]
fn iterates_collision_entries() {
    let mut trie = Trie::new();
    for i in 0..5_u32 {
        trie.insert(CollidingKey::new(i, 0x99), i);
    }
    for i in 100..110_u32 {
        trie.insert(CollidingKey::new(i, u64::from(i)), i);
    }

    let forward: Vec<u32> = trie.iter().map(|(_, v)| *v).collect();
    assert_eq!(forward.len(), 15);

    let mut reverse: Vec<u32> = trie.iter_rev().map(|(_, v)| *v).collect();
    reverse.reverse();
    assert_eq!(forward, reverse);
}

#[test]
fn into_iterator_for_ref() {
    let trie: Trie<u32, u32> = (0..20).map(|i| (i, i)).collect();
    let mut count = 0;
    for (k, v) in &trie {
        assert_eq!(k, v);
        count += 1;
    }
    assert_eq!(count, 20);
}
