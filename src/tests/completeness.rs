//! Change reporting: every mutation must say exactly what it did.

use crate::{ChangeEvent, Trie};

// ---------------------------------------------------------------------------
// insert must report what happened to the key
// ---------------------------------------------------------------------------

#[test]
fn insert_new_reports_added() {
    let mut trie = Trie::new();
    assert_eq!(trie.insert("key", 42), ChangeEvent::Added);
}

#[test]
fn insert_update_carries_old_value() {
    let mut trie = Trie::new();
    trie.insert("key", 1);
    let change = trie.insert("key", 2);
    assert_eq!(change.into_old(), Some(1));
}

#[test]
fn insert_update_chain() {
    let mut trie = Trie::new();
    assert_eq!(trie.insert("k", 10), ChangeEvent::Added);
    assert_eq!(trie.insert("k", 20), ChangeEvent::Replaced { old: 10 });
    assert_eq!(trie.insert("k", 30), ChangeEvent::Replaced { old: 20 });
    assert_eq!(trie.get(&"k"), Some(&30));
}

#[test]
fn unchanged_is_not_modified() {
    let mut trie = Trie::new();
    trie.insert("k", 1);
    assert!(!trie.insert("k", 1).is_modified());
    assert!(trie.insert("k", 2).is_modified());
}

// ---------------------------------------------------------------------------
// remove must carry the removed value
// ---------------------------------------------------------------------------

#[test]
fn remove_existing_carries_value() {
    let mut trie = Trie::new();
    trie.insert("a", 100);
    assert_eq!(trie.remove(&"a").into_old(), Some(100));
}

#[test]
fn remove_is_idempotent() {
    let mut trie = Trie::new();
    trie.insert("a", 1);
    assert!(trie.remove(&"a").is_modified());
    assert!(!trie.remove(&"a").is_modified());
    assert_eq!(trie.len(), 0);
}

#[test]
fn remove_from_empty() {
    let mut trie: Trie<i32, i32> = Trie::new();
    assert_eq!(trie.remove(&1), ChangeEvent::Unchanged);
}

// ---------------------------------------------------------------------------
// round-trip: find returns the value iff put more recently than any remove
// ---------------------------------------------------------------------------

#[test]
fn put_remove_put_round_trip() {
    let mut trie = Trie::new();
    trie.insert(7_u32, "one");
    trie.remove(&7);
    assert_eq!(trie.get(&7), None);
    trie.insert(7, "two");
    assert_eq!(trie.get(&7), Some(&"two"));
}
