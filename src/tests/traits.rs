use crate::Trie;

#[test]
fn default_is_empty() {
    let trie: Trie<i32, i32> = Trie::default();
    assert!(trie.is_empty());
}

#[test]
fn debug_shows_len() {
    let trie: Trie<i32, i32> = (0..3).map(|i| (i, i)).collect();
    let s = format!("{trie:?}");
    assert!(s.contains("Trie"), "{s}");
    assert!(s.contains('3'), "{s}");
}

#[test]
fn extend_and_from_iterator() {
    let mut trie: Trie<&str, i32> = [("a", 1)].into_iter().collect();
    trie.extend([("b", 2), ("c", 3)]);
    assert_eq!(trie.len(), 3);
    assert_eq!(trie.get(&"c"), Some(&3));
}

#[test]
fn index_returns_value() {
    let trie: Trie<&str, i32> = [("k", 9)].into_iter().collect();
    assert_eq!(trie[&"k"], 9);
}

#[test]
#[should_panic(expected = "key not found")]
fn index_missing_panics() {
    let trie: Trie<&str, i32> = Trie::new();
    let _ = trie[&"nope"];
}

#[test]
fn equality_is_reflexive_and_symmetric() {
    let a: Trie<u64, u64> = (0..40).map(|i| (i, i)).collect();
    let b: Trie<u64, u64> = (0..40).rev().map(|i| (i, i)).collect();
    assert_eq!(a, a);
    assert_eq!(a, b);
    assert_eq!(b, a);
}

#[test]
fn empty_tries_are_equal() {
    let a: Trie<i32, i32> = Trie::new();
    let b: Trie<i32, i32> = Trie::new();
    assert_eq!(a, b);
}
