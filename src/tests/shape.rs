//! Structural representation checks: walks every reachable node and
//! asserts the bitmap and canonical-form rules hold after arbitrary
//! operation mixes.

use safe_bump::Idx;

use super::collision::CollidingKey;
use crate::node::{self, Node};
use crate::store::ChampStore;
use crate::{ChampArena, Trie};

/// Recursively checks one subtree and returns the number of entries in it.
///
/// Checked per node: `data_map` and `node_map` are disjoint; every inline
/// entry sits under the bit matching its hash fragment at this level;
/// non-root singletons do not exist (they must be inlined into the
/// parent); every child subtree holds at least two entries; collision
/// nodes appear only past the last 5-bit level, with arity two or more
/// and a single shared hash.
fn walk<K, V>(store: &ChampArena<K, V>, idx: Idx<Node<K, V>>, shift: u32, is_root: bool) -> usize {
    match *store.get_node(idx) {
        Node::Inner {
            data_map,
            node_map,
            data_start,
            children_start,
            ..
        } => {
            assert!(shift <= node::MAX_SHIFT, "inner node below collision depth");
            assert_eq!(data_map & node_map, 0, "bit claimed as both data and child");
            assert!(
                is_root || !(node_map == 0 && data_map.is_power_of_two()),
                "non-root singleton was not inlined"
            );

            let mut size = 0;
            let mut rem = data_map | node_map;
            while rem != 0 {
                let bit = rem & rem.wrapping_neg();
                rem &= rem - 1;
                if data_map & bit != 0 {
                    let entry =
                        store.get_entry(node::offset(data_start, node::index(data_map, bit)));
                    assert_eq!(
                        node::fragment(entry.hash, shift),
                        bit.trailing_zeros(),
                        "entry stored under the wrong fragment"
                    );
                    size += 1;
                } else {
                    let child =
                        *store.get_child(node::offset(children_start, node::index(node_map, bit)));
                    let child_size = walk(store, child, shift + node::BITS_PER_LEVEL, false);
                    assert!(child_size >= 2, "child subtree holds fewer than two entries");
                    size += child_size;
                }
            }
            size
        }
        Node::Collision {
            hash,
            entries_start,
            entries_len,
            ..
        } => {
            assert!(shift > node::MAX_SHIFT, "collision node above max depth");
            assert!(entries_len >= 2, "collision node below arity two");
            for i in 0..usize::from(entries_len) {
                let entry = store.get_entry(node::offset(entries_start, i));
                assert_eq!(entry.hash, hash, "collision entry with a foreign hash");
            }
            usize::from(entries_len)
        }
    }
}

fn assert_canonical<K, V>(trie: &Trie<K, V>) {
    let (store, root) = trie.storage();
    let size = root.map_or(0, |idx| walk(store, idx, 0, true));
    assert_eq!(size, trie.len(), "reachable entries disagree with len");
}

#[test]
fn shape_holds_through_insert_remove_churn() {
    let mut trie = Trie::new();
    for i in 0_u64..500 {
        trie.insert(i, i);
    }
    assert_canonical(&trie);

    for i in (0_u64..500).filter(|i| i % 2 == 0) {
        trie.remove(&i);
    }
    assert_canonical(&trie);

    for i in (0_u64..500).filter(|i| i % 2 == 1 && *i != 251) {
        trie.remove(&i);
    }
    assert_eq!(trie.len(), 1);
    assert_canonical(&trie);

    trie.remove(&251);
    assert!(trie.is_empty());
    assert_canonical(&trie);
}

#[test]
fn shape_holds_with_collision_nodes() {
    let mut trie = Trie::new();
    for id in 0..6_u32 {
        trie.insert(CollidingKey::new(id, 0xC0FF_EE00), u64::from(id));
    }
    for id in 100..103_u32 {
        trie.insert(CollidingKey::new(id, 0xBADD_CAFE), u64::from(id));
    }
    for id in 1000..1200_u32 {
        trie.insert(CollidingKey::new(id, u64::from(id)), 0);
    }
    assert_canonical(&trie);

    // Shrinking a collision list to one entry promotes it back into the
    // trie proper.
    for id in 0..5_u32 {
        trie.remove(&CollidingKey::new(id, 0xC0FF_EE00));
    }
    for id in 100..102_u32 {
        trie.remove(&CollidingKey::new(id, 0xBADD_CAFE));
    }
    assert_canonical(&trie);
}

#[test]
fn shape_holds_after_bulk_ops() {
    let mut merged: Trie<u64, u64> = (0..300).map(|i| (i, i)).collect();
    let overlap: Trie<u64, u64> = (150..450).map(|i| (i, i + 1000)).collect();
    merged.put_all(&overlap);
    assert_canonical(&merged);

    let mut grafted = Trie::new();
    grafted.put_all(&overlap);
    assert_canonical(&grafted);

    let victims: Trie<u64, u64> = (0..200).map(|i| (i, 0)).collect();
    merged.remove_all(&victims);
    assert_canonical(&merged);

    merged.retain_all(&overlap);
    assert_canonical(&merged);

    merged.filter_all(|k, _| k % 3 != 0);
    assert_canonical(&merged);
}

#[test]
fn shape_holds_after_transient_session() {
    let mut trie: Trie<u64, u64> = (0..100).map(|i| (i, i)).collect();
    {
        let mut session = trie.transient();
        for i in 50..250 {
            session.insert(i, i * 7);
        }
        for i in 0..30 {
            session.remove(&i);
        }
    }
    assert_canonical(&trie);
}
