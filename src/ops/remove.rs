//! Removal operation — path-copy delete with canonical inlining and an
//! in-place fast path for owned nodes.

use safe_bump::Idx;

use crate::node::{self, Entry, Node};
use crate::ops::blocks::{
    alloc_or_sentinel, build_children_removing, build_children_replacing,
    build_entries_inserting, build_entries_removing, clone_entry, write_collision, write_inner,
};
use crate::store::ChampStore;

/// Outcome of a recursive remove.
pub enum RemoveOutcome<K, V> {
    /// Key was not found — tree unchanged.
    NotFound,
    /// Key was removed.
    Removed {
        /// New root of the modified subtree, or `None` if the subtree is
        /// now empty.
        node: Option<Idx<Node<K, V>>>,
        /// The removed value.
        old: V,
    },
}

/// Removes `key` from the subtree rooted at `node_idx`.
///
/// Keeps the trie canonical: a subtree reduced to a single inline entry is
/// handed back for the parent to inline, collapsing chains of one-child
/// nodes so trie depth stays proportional to key diversity.
pub fn remove_recursive<K, V, S>(
    store: &mut S,
    node_idx: Idx<Node<K, V>>,
    hash: u32,
    key: &K,
    shift: u32,
    owner: u64,
) -> RemoveOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone,
    S: ChampStore<K, V>,
{
    let this = *store.get_node(node_idx);
    match this {
        Node::Inner {
            data_map,
            node_map,
            data_start,
            children_start,
            ..
        } => remove_from_inner(
            store,
            node_idx,
            this,
            data_map,
            node_map,
            data_start,
            children_start,
            hash,
            key,
            shift,
            owner,
        ),
        Node::Collision {
            hash: node_hash,
            entries_start,
            entries_len,
            ..
        } => remove_from_collision(
            store,
            node_idx,
            this,
            node_hash,
            entries_start,
            entries_len,
            hash,
            key,
            owner,
        ),
    }
}

// ---------------------------------------------------------------------------
// Inner node remove
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn remove_from_inner<K, V, S>(
    store: &mut S,
    node_idx: Idx<Node<K, V>>,
    this: Node<K, V>,
    data_map: u32,
    node_map: u32,
    data_start: Idx<Entry<K, V>>,
    children_start: Idx<Idx<Node<K, V>>>,
    hash: u32,
    key: &K,
    shift: u32,
    owner: u64,
) -> RemoveOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone,
    S: ChampStore<K, V>,
{
    let frag = node::fragment(hash, shift);
    let bit = node::mask(frag);
    let data_len = data_map.count_ones() as usize;
    let children_len = node_map.count_ones() as usize;

    if data_map & bit != 0 {
        let pos = node::index(data_map, bit);
        let (found, old) = {
            let e = store.get_entry(node::offset(data_start, pos));
            (e.hash == hash && e.key == *key, e.value.clone())
        };

        if !found {
            return RemoveOutcome::NotFound;
        }

        let new_data_map = data_map & !bit;

        // Removing the last entry with no children → empty subtree.
        if new_data_map == 0 && node_map == 0 {
            return RemoveOutcome::Removed { node: None, old };
        }

        let entries = build_entries_removing(store, data_start, data_len, pos);
        let new_data = alloc_or_sentinel(store.alloc_entries(entries));
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
        RemoveOutcome::Removed {
            node: Some(node),
            old,
        }
    } else if node_map & bit != 0 {
        let child_pos = node::index(node_map, bit);
        let old_child = *store.get_child(node::offset(children_start, child_pos));
        let outcome = remove_recursive(
            store,
            old_child,
            hash,
            key,
            shift + node::BITS_PER_LEVEL,
            owner,
        );

        match outcome {
            RemoveOutcome::NotFound => RemoveOutcome::NotFound,
            RemoveOutcome::Removed {
                node: new_child,
                old,
            } => {
                if let Some(child_idx) = new_child {
                    // Child still exists — check if it should be inlined.
                    let child_node = *store.get_node(child_idx);
                    if should_inline(&child_node) {
                        let node = inline_child(
                            store,
                            node_idx,
                            this,
                            data_map,
                            node_map,
                            data_start,
                            children_start,
                            bit,
                            child_pos,
                            child_idx,
                            owner,
                            data_len,
                            children_len,
                        );
                        RemoveOutcome::Removed {
                            node: Some(node),
                            old,
                        }
                    } else if child_idx.into_raw() == old_child.into_raw() {
                        // Child rewritten in place — nothing to repoint.
                        RemoveOutcome::Removed {
                            node: Some(node_idx),
                            old,
                        }
                    } else {
                        // Keep child as subtree, update pointer.
                        let children = build_children_replacing(
                            store,
                            children_start,
                            children_len,
                            child_pos,
                            child_idx,
                        );
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
                        RemoveOutcome::Removed {
                            node: Some(node),
                            old,
                        }
                    }
                } else {
                    // Child became empty — remove child slot.
                    let new_node_map = node_map & !bit;
                    if data_map == 0 && new_node_map == 0 {
                        return RemoveOutcome::Removed { node: None, old };
                    }
                    let children =
                        build_children_removing(store, children_start, children_len, child_pos);
                    let new_children = alloc_or_sentinel(store.alloc_children(children));
                    let node = write_inner(
                        store,
                        node_idx,
                        this,
                        owner,
                        data_map,
                        new_node_map,
                        data_start,
                        new_children,
                    );
                    RemoveOutcome::Removed {
                        node: Some(node),
                        old,
                    }
                }
            }
        }
    } else {
        RemoveOutcome::NotFound
    }
}

/// Canonical form: a child with exactly one entry and no children
/// should be inlined back into the parent.
pub const fn should_inline<K, V>(node: &Node<K, V>) -> bool {
    match node {
        Node::Inner {
            data_map, node_map, ..
        } => data_map.is_power_of_two() && *node_map == 0,
        Node::Collision { .. } => false,
    }
}

/// Inlines a single-entry child back into the parent node.
#[allow(clippy::too_many_arguments)]
fn inline_child<K, V, S>(
    store: &mut S,
    node_idx: Idx<Node<K, V>>,
    this: Node<K, V>,
    data_map: u32,
    node_map: u32,
    data_start: Idx<Entry<K, V>>,
    children_start: Idx<Idx<Node<K, V>>>,
    bit: u32,
    child_pos: usize,
    child_idx: Idx<Node<K, V>>,
    owner: u64,
    data_len: usize,
    children_len: usize,
) -> Idx<Node<K, V>>
where
    K: Clone,
    V: Clone,
    S: ChampStore<K, V>,
{
    // Read the single entry from the child.
    let child = *store.get_node(child_idx);
    let child_data_start = match child {
        Node::Inner { data_start, .. } => data_start,
        Node::Collision { .. } => unreachable!("should_inline returned false for collision"),
    };
    let inlined_entry = clone_entry(store, child_data_start);

    // Remove child from children, add entry to data.
    let new_data_map = data_map | bit;
    let new_node_map = node_map & !bit;
    let data_insert_at = node::index(new_data_map, bit);

    let entries =
        build_entries_inserting(store, data_start, data_len, data_insert_at, inlined_entry);
    let children = build_children_removing(store, children_start, children_len, child_pos);

    let new_data = store.alloc_entries(entries).expect("non-empty after inline");
    let new_children = alloc_or_sentinel(store.alloc_children(children));

    write_inner(
        store,
        node_idx,
        this,
        owner,
        new_data_map,
        new_node_map,
        new_data,
        new_children,
    )
}

// ---------------------------------------------------------------------------
// Collision node remove
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn remove_from_collision<K, V, S>(
    store: &mut S,
    node_idx: Idx<Node<K, V>>,
    this: Node<K, V>,
    node_hash: u32,
    entries_start: Idx<Entry<K, V>>,
    entries_len: u8,
    hash: u32,
    key: &K,
    owner: u64,
) -> RemoveOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone,
    S: ChampStore<K, V>,
{
    if hash != node_hash {
        return RemoveOutcome::NotFound;
    }

    let len = usize::from(entries_len);
    for i in 0..len {
        let (found, old) = {
            let e = store.get_entry(node::offset(entries_start, i));
            (e.key == *key, e.value.clone())
        };

        if !found {
            continue;
        }

        if len == 2 {
            // Collision with 2 entries → removing one leaves a single entry.
            // Promote it to a regular inner node; the parent will inline it,
            // re-masking the hash from shift 0.
            let other = 1 - i;
            let remaining = clone_entry(store, node::offset(entries_start, other));
            let frag = node::fragment(remaining.hash, 0);
            let bit = node::mask(frag);
            let remaining_start = store.alloc_entries([remaining]).expect("single entry");
            let node = write_inner(
                store,
                node_idx,
                this,
                owner,
                bit,
                0,
                remaining_start,
                Idx::from_raw(0),
            );
            return RemoveOutcome::Removed {
                node: Some(node),
                old,
            };
        }

        let entries = build_entries_removing(store, entries_start, len, i);
        let new_start = store.alloc_entries(entries).expect("at least 2 remaining");
        let node = write_collision(
            store,
            node_idx,
            this,
            owner,
            node_hash,
            new_start,
            entries_len - 1,
        );
        return RemoveOutcome::Removed {
            node: Some(node),
            old,
        };
    }

    RemoveOutcome::NotFound
}
