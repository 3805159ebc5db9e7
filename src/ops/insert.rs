//! Insertion operation — path-copy put with an in-place fast path for
//! owned nodes.

use safe_bump::Idx;

use crate::change::ChangeEvent;
use crate::node::{self, Entry, Node};
use crate::ops::blocks::{
    alloc_or_sentinel, build_children_inserting, build_children_replacing,
    build_entries_inserting, build_entries_removing, build_entries_replacing, clone_entry,
    write_collision, write_inner,
};
use crate::store::ChampStore;

/// Outcome of a recursive insert.
pub struct InsertOutcome<K, V> {
    /// Root of the updated subtree. Equal to the input index when the node
    /// was left untouched or rewritten in place under its owner stamp.
    pub node: Idx<Node<K, V>>,
    /// What the operation did.
    pub change: ChangeEvent<V>,
}

/// Inserts `entry` into the subtree rooted at `node_idx`.
///
/// When an existing key is hit, the stored value is combined with the
/// incoming one via `update(&old, &new)`; an update that returns a value
/// equal to the old one reports [`ChangeEvent::Unchanged`] and leaves the
/// subtree untouched. Nodes stamped with `owner` are rewritten in place
/// (keeping their index stable); all other nodes are copied.
pub fn insert_recursive<K, V, S, F>(
    store: &mut S,
    node_idx: Idx<Node<K, V>>,
    entry: Entry<K, V>,
    shift: u32,
    owner: u64,
    update: &mut F,
) -> InsertOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone + PartialEq,
    S: ChampStore<K, V>,
    F: FnMut(&V, &V) -> V,
{
    let this = *store.get_node(node_idx);
    match this {
        Node::Inner {
            data_map,
            node_map,
            data_start,
            children_start,
            ..
        } => insert_into_inner(
            store,
            node_idx,
            this,
            data_map,
            node_map,
            data_start,
            children_start,
            entry,
            shift,
            owner,
            update,
        ),
        Node::Collision {
            hash: node_hash,
            entries_start,
            entries_len,
            ..
        } => insert_into_collision(
            store,
            node_idx,
            this,
            node_hash,
            entries_start,
            entries_len,
            entry,
            owner,
            update,
        ),
    }
}

// ---------------------------------------------------------------------------
// Inner node insert
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn insert_into_inner<K, V, S, F>(
    store: &mut S,
    node_idx: Idx<Node<K, V>>,
    this: Node<K, V>,
    data_map: u32,
    node_map: u32,
    data_start: Idx<Entry<K, V>>,
    children_start: Idx<Idx<Node<K, V>>>,
    entry: Entry<K, V>,
    shift: u32,
    owner: u64,
    update: &mut F,
) -> InsertOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone + PartialEq,
    S: ChampStore<K, V>,
    F: FnMut(&V, &V) -> V,
{
    let frag = node::fragment(entry.hash, shift);
    let bit = node::mask(frag);
    let data_len = data_map.count_ones() as usize;
    let children_len = node_map.count_ones() as usize;

    if data_map & bit != 0 {
        let pos = node::index(data_map, bit);
        let (key_eq, old_value) = {
            let e = store.get_entry(node::offset(data_start, pos));
            (e.hash == entry.hash && e.key == entry.key, e.value.clone())
        };

        if key_eq {
            // Same key → combine values.
            let merged = update(&old_value, &entry.value);
            if merged == old_value {
                return InsertOutcome {
                    node: node_idx,
                    change: ChangeEvent::Unchanged,
                };
            }
            let replacement = Entry {
                hash: entry.hash,
                key: entry.key,
                value: merged,
            };
            let entries = build_entries_replacing(store, data_start, data_len, pos, replacement);
            let new_data = store.alloc_entries(entries).expect("non-empty");
            let node = write_inner(
                store,
                node_idx,
                this,
                owner,
                data_map,
                node_map,
                new_data,
                children_start,
            );
            InsertOutcome {
                node,
                change: ChangeEvent::Replaced { old: old_value },
            }
        } else {
            // Different key at same position → push both into a subtree.
            let existing = clone_entry(store, node::offset(data_start, pos));
            let subtree =
                create_subtree(store, existing, entry, shift + node::BITS_PER_LEVEL, owner);

            let new_data_map = data_map & !bit;
            let new_node_map = node_map | bit;
            let child_pos = node::index(new_node_map, bit);

            let entries = build_entries_removing(store, data_start, data_len, pos);
            let children =
                build_children_inserting(store, children_start, children_len, child_pos, subtree);

            let new_data = alloc_or_sentinel(store.alloc_entries(entries));
            let new_children = store.alloc_children(children).expect("non-empty");

            let node = write_inner(
                store,
                node_idx,
                this,
                owner,
                new_data_map,
                new_node_map,
                new_data,
                new_children,
            );
            InsertOutcome {
                node,
                change: ChangeEvent::Added,
            }
        }
    } else if node_map & bit != 0 {
        // Position has a child subtree → recurse.
        let child_pos = node::index(node_map, bit);
        let old_child = *store.get_child(node::offset(children_start, child_pos));
        let outcome = insert_recursive(
            store,
            old_child,
            entry,
            shift + node::BITS_PER_LEVEL,
            owner,
            update,
        );

        if outcome.node.into_raw() == old_child.into_raw() {
            // Child untouched or rewritten in place — nothing to repoint.
            return InsertOutcome {
                node: node_idx,
                change: outcome.change,
            };
        }

        let children =
            build_children_replacing(store, children_start, children_len, child_pos, outcome.node);
        let new_children = store.alloc_children(children).expect("non-empty");
        let node = write_inner(
            store,
            node_idx,
            this,
            owner,
            data_map,
            node_map,
            data_start,
            new_children,
        );
        InsertOutcome {
            node,
            change: outcome.change,
        }
    } else {
        // Position empty → add inline entry.
        let new_data_map = data_map | bit;
        let insert_at = node::index(new_data_map, bit);
        let entries = build_entries_inserting(store, data_start, data_len, insert_at, entry);
        let new_data = store.alloc_entries(entries).expect("non-empty");

        let node = write_inner(
            store,
            node_idx,
            this,
            owner,
            new_data_map,
            node_map,
            new_data,
            children_start,
        );
        InsertOutcome {
            node,
            change: ChangeEvent::Added,
        }
    }
}

// ---------------------------------------------------------------------------
// Collision node insert
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn insert_into_collision<K, V, S, F>(
    store: &mut S,
    node_idx: Idx<Node<K, V>>,
    this: Node<K, V>,
    node_hash: u32,
    entries_start: Idx<Entry<K, V>>,
    entries_len: u8,
    entry: Entry<K, V>,
    owner: u64,
    update: &mut F,
) -> InsertOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone + PartialEq,
    S: ChampStore<K, V>,
    F: FnMut(&V, &V) -> V,
{
    // A collision node is only reachable along its own hash path.
    debug_assert_eq!(entry.hash, node_hash, "hash mismatch in collision node");

    let len = usize::from(entries_len);

    // Search for existing key.
    for i in 0..len {
        let (key_eq, old_value) = {
            let e = store.get_entry(node::offset(entries_start, i));
            (e.key == entry.key, e.value.clone())
        };
        if !key_eq {
            continue;
        }
        let merged = update(&old_value, &entry.value);
        if merged == old_value {
            return InsertOutcome {
                node: node_idx,
                change: ChangeEvent::Unchanged,
            };
        }
        let replacement = Entry {
            hash: entry.hash,
            key: entry.key,
            value: merged,
        };
        let entries = build_entries_replacing(store, entries_start, len, i, replacement);
        let new_start = store.alloc_entries(entries).expect("non-empty");
        let node = write_collision(store, node_idx, this, owner, node_hash, new_start, entries_len);
        return InsertOutcome {
            node,
            change: ChangeEvent::Replaced { old: old_value },
        };
    }

    // Key not found → append.
    let new_len = entries_len
        .checked_add(1)
        .expect("collision node overflow (>255 entries)");
    let mut entries = Vec::with_capacity(len + 1);
    for i in 0..len {
        entries.push(clone_entry(store, node::offset(entries_start, i)));
    }
    entries.push(entry);
    let new_start = store.alloc_entries(entries).expect("non-empty");
    let node = write_collision(store, node_idx, this, owner, node_hash, new_start, new_len);
    InsertOutcome {
        node,
        change: ChangeEvent::Added,
    }
}

// ---------------------------------------------------------------------------
// Batch subtree creation
// ---------------------------------------------------------------------------

/// Creates a subtree from two entries that collide at the current depth.
///
/// Recursively descends until hash fragments differ, or creates a collision
/// node once the 32-bit hash is exhausted (`shift > MAX_SHIFT`).
pub fn create_subtree<K, V, S>(
    store: &mut S,
    e1: Entry<K, V>,
    e2: Entry<K, V>,
    shift: u32,
    owner: u64,
) -> Idx<Node<K, V>>
where
    S: ChampStore<K, V>,
{
    if shift > node::MAX_SHIFT {
        let hash = e1.hash;
        let start = store.alloc_entries([e1, e2]).expect("two entries");
        return store.alloc_node(Node::Collision {
            hash,
            entries_start: start,
            entries_len: 2,
            owner,
        });
    }

    let f1 = node::fragment(e1.hash, shift);
    let f2 = node::fragment(e2.hash, shift);

    if f1 == f2 {
        let child = create_subtree(store, e1, e2, shift + node::BITS_PER_LEVEL, owner);
        let children_start = store.alloc_children([child]).expect("one child");
        store.alloc_node(Node::Inner {
            data_map: 0,
            node_map: node::mask(f1),
            data_start: Idx::from_raw(0),
            children_start,
            owner,
        })
    } else {
        let entries: [Entry<K, V>; 2] = if f1 < f2 { [e1, e2] } else { [e2, e1] };
        let data_start = store.alloc_entries(entries).expect("two entries");
        store.alloc_node(Node::Inner {
            data_map: node::mask(f1) | node::mask(f2),
            node_map: 0,
            data_start,
            children_start: Idx::from_raw(0),
            owner,
        })
    }
}
