//! Entry / children block builders shared by the mutation operations.
//!
//! Blocks are write-once arena slices; every structural change builds the
//! successor block here and allocates it fresh. Only the minimal region is
//! rebuilt — the surrounding node decides whether the node record itself is
//! rewritten in place or copied.

use safe_bump::Idx;

use crate::node::{self, Entry, Node};
use crate::store::ChampStore;

/// Clones the entry at `idx` out of the arena.
pub fn clone_entry<K: Clone, V: Clone, S: ChampStore<K, V>>(
    store: &S,
    idx: Idx<Entry<K, V>>,
) -> Entry<K, V> {
    store.get_entry(idx).clone()
}

/// Copies the block `[start, start+len)` inserting `entry` at `at`.
pub fn build_entries_inserting<K: Clone, V: Clone, S: ChampStore<K, V>>(
    store: &S,
    start: Idx<Entry<K, V>>,
    len: usize,
    at: usize,
    entry: Entry<K, V>,
) -> Vec<Entry<K, V>> {
    let mut out = Vec::with_capacity(len + 1);
    for i in 0..at {
        out.push(clone_entry(store, node::offset(start, i)));
    }
    out.push(entry);
    for i in at..len {
        out.push(clone_entry(store, node::offset(start, i)));
    }
    out
}

/// Copies the block `[start, start+len)` replacing position `at` with `entry`.
pub fn build_entries_replacing<K: Clone, V: Clone, S: ChampStore<K, V>>(
    store: &S,
    start: Idx<Entry<K, V>>,
    len: usize,
    at: usize,
    entry: Entry<K, V>,
) -> Vec<Entry<K, V>> {
    let mut out = Vec::with_capacity(len);
    for i in 0..at {
        out.push(clone_entry(store, node::offset(start, i)));
    }
    out.push(entry);
    for i in (at + 1)..len {
        out.push(clone_entry(store, node::offset(start, i)));
    }
    out
}

/// Copies the block `[start, start+len)` dropping position `at`.
pub fn build_entries_removing<K: Clone, V: Clone, S: ChampStore<K, V>>(
    store: &S,
    start: Idx<Entry<K, V>>,
    len: usize,
    at: usize,
) -> Vec<Entry<K, V>> {
    let mut out = Vec::with_capacity(len - 1);
    for i in 0..len {
        if i != at {
            out.push(clone_entry(store, node::offset(start, i)));
        }
    }
    out
}

/// Copies the child block `[start, start+len)` inserting `child` at `at`.
pub fn build_children_inserting<K, V, S: ChampStore<K, V>>(
    store: &S,
    start: Idx<Idx<Node<K, V>>>,
    len: usize,
    at: usize,
    child: Idx<Node<K, V>>,
) -> Vec<Idx<Node<K, V>>> {
    let mut out = Vec::with_capacity(len + 1);
    for i in 0..at {
        out.push(*store.get_child(node::offset(start, i)));
    }
    out.push(child);
    for i in at..len {
        out.push(*store.get_child(node::offset(start, i)));
    }
    out
}

/// Copies the child block `[start, start+len)` replacing position `at`.
pub fn build_children_replacing<K, V, S: ChampStore<K, V>>(
    store: &S,
    start: Idx<Idx<Node<K, V>>>,
    len: usize,
    at: usize,
    child: Idx<Node<K, V>>,
) -> Vec<Idx<Node<K, V>>> {
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        if i == at {
            out.push(child);
        } else {
            out.push(*store.get_child(node::offset(start, i)));
        }
    }
    out
}

/// Copies the child block `[start, start+len)` dropping position `at`.
pub fn build_children_removing<K, V, S: ChampStore<K, V>>(
    store: &S,
    start: Idx<Idx<Node<K, V>>>,
    len: usize,
    at: usize,
) -> Vec<Idx<Node<K, V>>> {
    let mut out = Vec::with_capacity(len - 1);
    for i in 0..len {
        if i != at {
            out.push(*store.get_child(node::offset(start, i)));
        }
    }
    out
}

/// Writes updated inner-node fields: in place when `this` carries the
/// caller's owner stamp (index stays stable, ancestors need no repoint),
/// otherwise as a freshly allocated node stamped with `owner`.
#[allow(clippy::too_many_arguments)]
pub fn write_inner<K, V, S>(
    store: &mut S,
    node_idx: Idx<Node<K, V>>,
    this: Node<K, V>,
    owner: u64,
    data_map: u32,
    node_map: u32,
    data_start: Idx<Entry<K, V>>,
    children_start: Idx<Idx<Node<K, V>>>,
) -> Idx<Node<K, V>>
where
    S: ChampStore<K, V>,
{
    let updated = Node::Inner {
        data_map,
        node_map,
        data_start,
        children_start,
        owner,
    };
    if this.is_allowed_to_update(owner) {
        *store.get_node_mut(node_idx) = updated;
        node_idx
    } else {
        store.alloc_node(updated)
    }
}

/// Collision-node counterpart of [`write_inner`].
pub fn write_collision<K, V, S>(
    store: &mut S,
    node_idx: Idx<Node<K, V>>,
    this: Node<K, V>,
    owner: u64,
    hash: u32,
    entries_start: Idx<Entry<K, V>>,
    entries_len: u8,
) -> Idx<Node<K, V>>
where
    S: ChampStore<K, V>,
{
    let updated = Node::Collision {
        hash,
        entries_start,
        entries_len,
        owner,
    };
    if this.is_allowed_to_update(owner) {
        *store.get_node_mut(node_idx) = updated;
        node_idx
    } else {
        store.alloc_node(updated)
    }
}

/// Returns the index from an `Option`, using a sentinel for `None`.
///
/// Used when a bitmap is zero (no entries/children) and the start index
/// is dead state — never accessed because the bitmap guards it.
#[allow(clippy::option_if_let_else)]
pub const fn alloc_or_sentinel<T>(idx: Option<Idx<T>>) -> Idx<T> {
    match idx {
        Some(i) => i,
        None => Idx::from_raw(0),
    }
}
