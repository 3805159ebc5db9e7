use std::hash::{Hash, Hasher};

use crate::{ChangeEvent, Trie};

/// A key type with a controllable hash value for testing hash collisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct CollidingKey {
    pub(super) id: u32,
    forced_hash: u64,
}

impl CollidingKey {
    pub(super) const fn new(id: u32, hash: u64) -> Self {
        Self {
            id,
            forced_hash: hash,
        }
    }
}

impl Hash for CollidingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.forced_hash.hash(state);
    }
}

/// Two keys with the same hash create a collision node once the 32-bit
/// hash is exhausted.
#[test]
fn two_colliding_keys() {
    let k1 = CollidingKey::new(1, 0xDEAD_BEEF);
    let k2 = CollidingKey::new(2, 0xDEAD_BEEF);

    let mut trie = Trie::new();
    trie.insert(k1.clone(), "first");
    trie.insert(k2.clone(), "second");

    assert_eq!(trie.len(), 2);
    assert_eq!(trie.get(&k1), Some(&"first"));
    assert_eq!(trie.get(&k2), Some(&"second"));
}

/// Three keys with the same hash.
#[test]
fn three_colliding_keys() {
    let keys: Vec<CollidingKey> = (0..3).map(|i| CollidingKey::new(i, 0xCAFE)).collect();

    let mut trie = Trie::new();
    for (i, k) in keys.iter().enumerate() {
        trie.insert(k.clone(), i);
    }
    assert_eq!(trie.len(), 3);
    for (i, k) in keys.iter().enumerate() {
        assert_eq!(trie.get(k), Some(&i));
    }
}

/// Same hash, missing key: the collision list must not match by hash alone.
#[test]
fn colliding_lookup_checks_key() {
    let k1 = CollidingKey::new(1, 0xAB);
    let k2 = CollidingKey::new(2, 0xAB);
    let absent = CollidingKey::new(3, 0xAB);

    let mut trie = Trie::new();
    trie.insert(k1, 1);
    trie.insert(k2, 2);
    assert_eq!(trie.get(&absent), None);
}

/// Overwriting inside a collision node.
#[test]
fn colliding_overwrite() {
    let k1 = CollidingKey::new(1, 0x11);
    let k2 = CollidingKey::new(2, 0x11);

    let mut trie = Trie::new();
    trie.insert(k1.clone(), 10);
    trie.insert(k2, 20);
    assert_eq!(trie.insert(k1.clone(), 99), ChangeEvent::Replaced { old: 10 });
    assert_eq!(trie.get(&k1), Some(&99));
}

/// Removing down to one entry promotes the survivor back into the trie
/// (canonical form: no single-entry collision nodes).
#[test]
fn collision_shrinks_to_regular_entry() {
    let keys: Vec<CollidingKey> = (0..3).map(|i| CollidingKey::new(i, 0x77)).collect();

    let mut trie = Trie::new();
    for (i, k) in keys.iter().enumerate() {
        trie.insert(k.clone(), i);
    }
    assert_eq!(trie.remove(&keys[0]), ChangeEvent::Removed { old: 0 });
    assert_eq!(trie.remove(&keys[1]), ChangeEvent::Removed { old: 1 });

    assert_eq!(trie.len(), 1);
    assert_eq!(trie.get(&keys[2]), Some(&2));

    // The promoted entry must still be removable.
    assert_eq!(trie.remove(&keys[2]), ChangeEvent::Removed { old: 2 });
    assert!(trie.is_empty());
}

/// Mixed population: colliding keys among regular ones.
#[test]
fn collisions_among_regular_keys() {
    let c1 = CollidingKey::new(1000, 0x5555);
    let c2 = CollidingKey::new(2000, 0x5555);

    let mut trie = Trie::new();
    for i in 0..100 {
        trie.insert(CollidingKey::new(i, u64::from(i) * 31), i);
    }
    trie.insert(c1.clone(), 111);
    trie.insert(c2.clone(), 222);

    assert_eq!(trie.len(), 102);
    assert_eq!(trie.get(&c1), Some(&111));
    assert_eq!(trie.get(&c2), Some(&222));
    for i in 0..100 {
        assert_eq!(trie.get(&CollidingKey::new(i, u64::from(i) * 31)), Some(&i));
    }
}
