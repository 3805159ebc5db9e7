//! Bulk set-algebra operations — `put_all`, `remove_all`, `retain_all`,
//! `filter_all`.
//!
//! All four walk the occupied bit positions of two tries in lock-step,
//! classifying each position by which side holds data or a subtree there
//! and combining per the operation's table. Subtrees that end up unchanged
//! are returned by their original index, so merging a trie with an equal
//! one is structurally a no-op. Subtrees taken from the other handle's
//! store are grafted (node-for-node structural copy) since arena indices
//! are store-local; structure is copied without re-hashing or per-element
//! re-insertion.

use safe_bump::Idx;

use crate::change::{BulkChangeEvent, ChangeEvent};
use crate::node::{self, Entry, Node};
use crate::ops::blocks::{alloc_or_sentinel, clone_entry, write_collision, write_inner};
use crate::ops::compare::size_recursive;
use crate::ops::get::get_recursive;
use crate::ops::insert::{create_subtree, insert_recursive};
use crate::ops::remove::{RemoveOutcome, remove_recursive, should_inline};
use crate::store::ChampStore;

/// Result of a shrinking bulk operation on one subtree.
pub enum MergeOutcome<K, V> {
    /// The subtree lost all entries.
    Empty,
    /// The subtree was reduced to a single entry; the parent inlines it
    /// into a data slot (canonical form).
    Single(Entry<K, V>),
    /// The subtree survived with two or more entries.
    Node(Idx<Node<K, V>>),
}

/// Outcome of `remove_all`/`retain_all`/`filter_all` on one subtree.
pub struct PruneOutcome<K, V> {
    /// The surviving subtree. `changed == false` implies this is the
    /// original node, index included.
    pub node: MergeOutcome<K, V>,
    /// `true` if the subtree's representation differs from the input.
    pub changed: bool,
}

/// Outcome of `put_all` on one subtree (a union never becomes empty).
pub struct PutAllOutcome<K, V> {
    /// Root of the merged subtree; the original index when nothing changed.
    pub node: Idx<Node<K, V>>,
    /// `true` if the subtree's representation differs from the receiver's.
    pub changed: bool,
}

// ---------------------------------------------------------------------------
// Grafting
// ---------------------------------------------------------------------------

/// Copies the subtree rooted at `idx` from `src` into `dst`, node for node.
///
/// New nodes are stamped with `owner` so a transient session may keep
/// editing the grafted region in place.
pub fn graft_recursive<K, V, SD, SS>(
    dst: &mut SD,
    src: &SS,
    idx: Idx<Node<K, V>>,
    owner: u64,
) -> Idx<Node<K, V>>
where
    K: Clone,
    V: Clone,
    SD: ChampStore<K, V>,
    SS: ChampStore<K, V>,
{
    match *src.get_node(idx) {
        Node::Inner {
            data_map,
            node_map,
            data_start,
            children_start,
            ..
        } => {
            let data_len = data_map.count_ones() as usize;
            let children_len = node_map.count_ones() as usize;

            let mut entries = Vec::with_capacity(data_len);
            for i in 0..data_len {
                entries.push(clone_entry(src, node::offset(data_start, i)));
            }
            let mut children = Vec::with_capacity(children_len);
            for i in 0..children_len {
                let child = *src.get_child(node::offset(children_start, i));
                children.push(graft_recursive(dst, src, child, owner));
            }

            let new_data = alloc_or_sentinel(dst.alloc_entries(entries));
            let new_children = alloc_or_sentinel(dst.alloc_children(children));
            dst.alloc_node(Node::Inner {
                data_map,
                node_map,
                data_start: new_data,
                children_start: new_children,
                owner,
            })
        }
        Node::Collision {
            hash,
            entries_start,
            entries_len,
            ..
        } => {
            let len = usize::from(entries_len);
            let mut entries = Vec::with_capacity(len);
            for i in 0..len {
                entries.push(clone_entry(src, node::offset(entries_start, i)));
            }
            let new_start = dst.alloc_entries(entries).expect("non-empty");
            dst.alloc_node(Node::Collision {
                hash,
                entries_start: new_start,
                entries_len,
                owner,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// put_all
// ---------------------------------------------------------------------------

/// Merges the subtree `b` (from `src`) into subtree `a` (in `dst`).
///
/// Keys on both sides are combined via `update(&a_value, &b_value)`;
/// `bulk.replaced` is set when a combined value differs from `a`'s
/// original.
#[allow(clippy::cognitive_complexity, clippy::too_many_lines)]
pub fn put_all_recursive<K, V, SD, SS, F>(
    dst: &mut SD,
    src: &SS,
    a: Idx<Node<K, V>>,
    b: Idx<Node<K, V>>,
    shift: u32,
    owner: u64,
    bulk: &mut BulkChangeEvent,
    update: &mut F,
) -> PutAllOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone + PartialEq,
    SD: ChampStore<K, V>,
    SS: ChampStore<K, V>,
    F: FnMut(&V, &V) -> V,
{
    let an = *dst.get_node(a);
    let bn = *src.get_node(b);

    let (
        Node::Inner {
            data_map,
            node_map,
            data_start,
            children_start,
            ..
        },
        Node::Inner {
            data_map: b_data_map,
            node_map: b_node_map,
            data_start: b_data_start,
            children_start: b_children_start,
            ..
        },
    ) = (an, bn)
    else {
        return put_all_collision(dst, src, a, an, bn, owner, bulk, update);
    };

    let union = data_map | node_map | b_data_map | b_node_map;
    let mut new_data_map = 0_u32;
    let mut new_node_map = 0_u32;
    let mut entries: Vec<Entry<K, V>> = Vec::new();
    let mut children: Vec<Idx<Node<K, V>>> = Vec::new();
    let mut changed = false;

    let mut rem = union;
    while rem != 0 {
        let bit = rem & rem.wrapping_neg();
        rem &= rem - 1;

        let has_data = data_map & bit != 0;
        let has_node = node_map & bit != 0;
        let b_has_data = b_data_map & bit != 0;
        let b_has_node = b_node_map & bit != 0;

        if has_data && b_has_data {
            let ea = clone_entry(dst, node::offset(data_start, node::index(data_map, bit)));
            let eb = src.get_entry(node::offset(b_data_start, node::index(b_data_map, bit)));
            if ea.key == eb.key {
                bulk.in_both += 1;
                let merged = update(&ea.value, &eb.value);
                if merged == ea.value {
                    new_data_map |= bit;
                    entries.push(ea);
                } else {
                    bulk.replaced = true;
                    changed = true;
                    new_data_map |= bit;
                    entries.push(Entry {
                        hash: ea.hash,
                        key: ea.key,
                        value: merged,
                    });
                }
            } else {
                // Two distinct keys share this position → push into a subtree.
                let eb = eb.clone();
                let subtree = create_subtree(dst, ea, eb, shift + node::BITS_PER_LEVEL, owner);
                new_node_map |= bit;
                children.push(subtree);
                changed = true;
            }
        } else if has_data && b_has_node {
            // B's subtree claims the slot; fold A's single entry into a
            // grafted copy of it. The grafted tree holds B-side values, so
            // the combine order is restored by swapping the closure's
            // arguments.
            let ea = clone_entry(dst, node::offset(data_start, node::index(data_map, bit)));
            let bc = *src.get_child(node::offset(b_children_start, node::index(b_node_map, bit)));
            let grafted = graft_recursive(dst, src, bc, owner);
            let mut value_replaced = false;
            let outcome = insert_recursive(
                dst,
                grafted,
                ea,
                shift + node::BITS_PER_LEVEL,
                owner,
                &mut |old_val, new_val| {
                    let merged = update(new_val, old_val);
                    if merged != *new_val {
                        value_replaced = true;
                    }
                    merged
                },
            );
            match outcome.change {
                ChangeEvent::Added => {}
                ChangeEvent::Replaced { .. } | ChangeEvent::Unchanged => {
                    bulk.in_both += 1;
                    bulk.replaced |= value_replaced;
                }
                ChangeEvent::Removed { .. } => {
                    unreachable!("insert reported a removal")
                }
            }
            new_node_map |= bit;
            children.push(outcome.node);
            changed = true;
        } else if has_node && b_has_data {
            let ac = *dst.get_child(node::offset(children_start, node::index(node_map, bit)));
            let eb = src
                .get_entry(node::offset(b_data_start, node::index(b_data_map, bit)))
                .clone();
            let outcome =
                insert_recursive(dst, ac, eb, shift + node::BITS_PER_LEVEL, owner, update);
            match outcome.change {
                ChangeEvent::Added => {}
                ChangeEvent::Replaced { .. } => {
                    bulk.in_both += 1;
                    bulk.replaced = true;
                }
                ChangeEvent::Unchanged => {
                    bulk.in_both += 1;
                }
                ChangeEvent::Removed { .. } => {
                    unreachable!("insert reported a removal")
                }
            }
            changed |= outcome.node.into_raw() != ac.into_raw();
            new_node_map |= bit;
            children.push(outcome.node);
        } else if has_node && b_has_node {
            let ac = *dst.get_child(node::offset(children_start, node::index(node_map, bit)));
            let bc = *src.get_child(node::offset(b_children_start, node::index(b_node_map, bit)));
            let outcome = put_all_recursive(
                dst,
                src,
                ac,
                bc,
                shift + node::BITS_PER_LEVEL,
                owner,
                bulk,
                update,
            );
            changed |= outcome.changed;
            new_node_map |= bit;
            children.push(outcome.node);
        } else if has_data {
            new_data_map |= bit;
            entries.push(clone_entry(dst, node::offset(data_start, node::index(data_map, bit))));
        } else if has_node {
            new_node_map |= bit;
            children.push(*dst.get_child(node::offset(children_start, node::index(node_map, bit))));
        } else if b_has_data {
            new_data_map |= bit;
            entries.push(clone_entry(src, node::offset(b_data_start, node::index(b_data_map, bit))));
            changed = true;
        } else {
            // b_has_node only.
            let bc = *src.get_child(node::offset(b_children_start, node::index(b_node_map, bit)));
            new_node_map |= bit;
            children.push(graft_recursive(dst, src, bc, owner));
            changed = true;
        }
    }

    if !changed {
        return PutAllOutcome {
            node: a,
            changed: false,
        };
    }

    let new_data = alloc_or_sentinel(dst.alloc_entries(entries));
    let new_children = alloc_or_sentinel(dst.alloc_children(children));
    let node = write_inner(
        dst,
        a,
        an,
        owner,
        new_data_map,
        new_node_map,
        new_data,
        new_children,
    );
    PutAllOutcome {
        node,
        changed: true,
    }
}

/// Linear merge of two collision nodes sharing the same full hash.
#[allow(clippy::option_if_let_else, clippy::too_many_arguments)]
fn put_all_collision<K, V, SD, SS, F>(
    dst: &mut SD,
    src: &SS,
    a: Idx<Node<K, V>>,
    an: Node<K, V>,
    bn: Node<K, V>,
    owner: u64,
    bulk: &mut BulkChangeEvent,
    update: &mut F,
) -> PutAllOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone + PartialEq,
    SD: ChampStore<K, V>,
    SS: ChampStore<K, V>,
    F: FnMut(&V, &V) -> V,
{
    let (
        Node::Collision {
            hash: ah,
            entries_start,
            entries_len,
            ..
        },
        Node::Collision {
            hash: bh,
            entries_start: b_entries_start,
            entries_len: b_entries_len,
            ..
        },
    ) = (an, bn)
    else {
        unreachable!("collision node above max depth");
    };
    debug_assert_eq!(ah, bh, "lock-step collision nodes with different hashes");

    let mut out: Vec<Entry<K, V>> = Vec::with_capacity(usize::from(entries_len));
    for i in 0..usize::from(entries_len) {
        out.push(clone_entry(dst, node::offset(entries_start, i)));
    }
    let mut changed = false;
    for j in 0..usize::from(b_entries_len) {
        let eb = src.get_entry(node::offset(b_entries_start, j));
        if let Some(existing) = out.iter_mut().find(|e| e.key == eb.key) {
            bulk.in_both += 1;
            let merged = update(&existing.value, &eb.value);
            if merged != existing.value {
                bulk.replaced = true;
                changed = true;
                existing.value = merged;
            }
        } else {
            out.push(eb.clone());
            changed = true;
        }
    }

    if !changed {
        return PutAllOutcome {
            node: a,
            changed: false,
        };
    }

    let new_len = u8::try_from(out.len()).expect("collision node overflow (>255 entries)");
    let new_start = dst.alloc_entries(out).expect("non-empty");
    let node = write_collision(dst, a, an, owner, ah, new_start, new_len);
    PutAllOutcome {
        node,
        changed: true,
    }
}

// ---------------------------------------------------------------------------
// remove_all
// ---------------------------------------------------------------------------

/// Removes every key of subtree `b` (from `src`) from subtree `a`.
#[allow(clippy::cognitive_complexity, clippy::too_many_lines)]
pub fn remove_all_recursive<K, V, SD, SS>(
    dst: &mut SD,
    src: &SS,
    a: Idx<Node<K, V>>,
    b: Idx<Node<K, V>>,
    shift: u32,
    owner: u64,
    bulk: &mut BulkChangeEvent,
) -> PruneOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone,
    SD: ChampStore<K, V>,
    SS: ChampStore<K, V>,
{
    let an = *dst.get_node(a);
    let bn = *src.get_node(b);

    let (
        Node::Inner {
            data_map,
            node_map,
            data_start,
            children_start,
            ..
        },
        Node::Inner {
            data_map: b_data_map,
            node_map: b_node_map,
            data_start: b_data_start,
            children_start: b_children_start,
            ..
        },
    ) = (an, bn)
    else {
        return prune_collision(dst, src, a, an, bn, owner, bulk, PruneKind::Remove);
    };

    let mut new_data_map = 0_u32;
    let mut new_node_map = 0_u32;
    let mut entries: Vec<Entry<K, V>> = Vec::new();
    let mut children: Vec<Idx<Node<K, V>>> = Vec::new();
    let mut changed = false;

    let mut rem = data_map | node_map;
    while rem != 0 {
        let bit = rem & rem.wrapping_neg();
        rem &= rem - 1;

        let b_has_data = b_data_map & bit != 0;
        let b_has_node = b_node_map & bit != 0;

        if data_map & bit != 0 {
            let ea_idx = node::offset(data_start, node::index(data_map, bit));
            let dropped = if b_has_data {
                let eb = src.get_entry(node::offset(b_data_start, node::index(b_data_map, bit)));
                dst.get_entry(ea_idx).key == eb.key
            } else if b_has_node {
                let bc = *src.get_child(node::offset(b_children_start, node::index(b_node_map, bit)));
                let ea = dst.get_entry(ea_idx);
                get_recursive(src, bc, ea.hash, &ea.key, shift + node::BITS_PER_LEVEL).is_some()
            } else {
                false
            };
            if dropped {
                bulk.removed += 1;
                changed = true;
            } else {
                new_data_map |= bit;
                entries.push(clone_entry(dst, ea_idx));
            }
        } else {
            let ac = *dst.get_child(node::offset(children_start, node::index(node_map, bit)));
            if b_has_data {
                let (eb_hash, eb_key) = {
                    let eb = src.get_entry(node::offset(b_data_start, node::index(b_data_map, bit)));
                    (eb.hash, eb.key.clone())
                };
                match remove_recursive(
                    dst,
                    ac,
                    eb_hash,
                    &eb_key,
                    shift + node::BITS_PER_LEVEL,
                    owner,
                ) {
                    RemoveOutcome::NotFound => {
                        new_node_map |= bit;
                        children.push(ac);
                    }
                    RemoveOutcome::Removed { node: Some(n), .. } => {
                        bulk.removed += 1;
                        let n_node = *dst.get_node(n);
                        if should_inline(&n_node) {
                            let e = single_entry_of(dst, &n_node);
                            new_data_map |= bit;
                            entries.push(e);
                            changed = true;
                        } else {
                            changed |= n.into_raw() != ac.into_raw();
                            new_node_map |= bit;
                            children.push(n);
                        }
                    }
                    RemoveOutcome::Removed { node: None, .. } => {
                        // A canonical subtree holds >= 2 entries, so one
                        // removal cannot empty it.
                        unreachable!("subtree emptied by a single removal")
                    }
                }
            } else if b_has_node {
                let bc = *src.get_child(node::offset(b_children_start, node::index(b_node_map, bit)));
                let outcome = remove_all_recursive(
                    dst,
                    src,
                    ac,
                    bc,
                    shift + node::BITS_PER_LEVEL,
                    owner,
                    bulk,
                );
                changed |= outcome.changed;
                match outcome.node {
                    MergeOutcome::Empty => {}
                    MergeOutcome::Single(e) => {
                        new_data_map |= bit;
                        entries.push(e);
                    }
                    MergeOutcome::Node(n) => {
                        new_node_map |= bit;
                        children.push(n);
                    }
                }
            } else {
                new_node_map |= bit;
                children.push(ac);
            }
        }
    }

    finish_prune(
        dst,
        a,
        an,
        owner,
        changed,
        new_data_map,
        new_node_map,
        entries,
        children,
    )
}

// ---------------------------------------------------------------------------
// retain_all
// ---------------------------------------------------------------------------

/// Keeps only the keys of subtree `a` that are also present in subtree `b`.
#[allow(clippy::cognitive_complexity, clippy::option_if_let_else, clippy::too_many_lines)]
pub fn retain_all_recursive<K, V, SD, SS>(
    dst: &mut SD,
    src: &SS,
    a: Idx<Node<K, V>>,
    b: Idx<Node<K, V>>,
    shift: u32,
    owner: u64,
    bulk: &mut BulkChangeEvent,
) -> PruneOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone,
    SD: ChampStore<K, V>,
    SS: ChampStore<K, V>,
{
    let an = *dst.get_node(a);
    let bn = *src.get_node(b);

    let (
        Node::Inner {
            data_map,
            node_map,
            data_start,
            children_start,
            ..
        },
        Node::Inner {
            data_map: b_data_map,
            node_map: b_node_map,
            data_start: b_data_start,
            children_start: b_children_start,
            ..
        },
    ) = (an, bn)
    else {
        return prune_collision(dst, src, a, an, bn, owner, bulk, PruneKind::Retain);
    };

    let mut new_data_map = 0_u32;
    let mut new_node_map = 0_u32;
    let mut entries: Vec<Entry<K, V>> = Vec::new();
    let mut children: Vec<Idx<Node<K, V>>> = Vec::new();
    let mut changed = false;

    let mut rem = data_map | node_map;
    while rem != 0 {
        let bit = rem & rem.wrapping_neg();
        rem &= rem - 1;

        let b_has_data = b_data_map & bit != 0;
        let b_has_node = b_node_map & bit != 0;

        if data_map & bit != 0 {
            let ea_idx = node::offset(data_start, node::index(data_map, bit));
            let kept = if b_has_data {
                let eb = src.get_entry(node::offset(b_data_start, node::index(b_data_map, bit)));
                dst.get_entry(ea_idx).key == eb.key
            } else if b_has_node {
                let bc = *src.get_child(node::offset(b_children_start, node::index(b_node_map, bit)));
                let ea = dst.get_entry(ea_idx);
                get_recursive(src, bc, ea.hash, &ea.key, shift + node::BITS_PER_LEVEL).is_some()
            } else {
                false
            };
            if kept {
                bulk.in_both += 1;
                new_data_map |= bit;
                entries.push(clone_entry(dst, ea_idx));
            } else {
                bulk.removed += 1;
                changed = true;
            }
        } else {
            let ac = *dst.get_child(node::offset(children_start, node::index(node_map, bit)));
            if b_has_data {
                // At most one key of A's subtree can survive.
                let subtree_size = size_recursive(dst, ac);
                let eb = src.get_entry(node::offset(b_data_start, node::index(b_data_map, bit)));
                let found = get_recursive(dst, ac, eb.hash, &eb.key, shift + node::BITS_PER_LEVEL)
                    .map(|v| (eb.hash, eb.key.clone(), v.clone()));
                if let Some((hash, key, value)) = found {
                    bulk.in_both += 1;
                    bulk.removed += subtree_size - 1;
                    new_data_map |= bit;
                    entries.push(Entry { hash, key, value });
                } else {
                    bulk.removed += subtree_size;
                }
                changed = true;
            } else if b_has_node {
                let bc = *src.get_child(node::offset(b_children_start, node::index(b_node_map, bit)));
                let outcome = retain_all_recursive(
                    dst,
                    src,
                    ac,
                    bc,
                    shift + node::BITS_PER_LEVEL,
                    owner,
                    bulk,
                );
                changed |= outcome.changed;
                match outcome.node {
                    MergeOutcome::Empty => {}
                    MergeOutcome::Single(e) => {
                        new_data_map |= bit;
                        entries.push(e);
                    }
                    MergeOutcome::Node(n) => {
                        new_node_map |= bit;
                        children.push(n);
                    }
                }
            } else {
                bulk.removed += size_recursive(dst, ac);
                changed = true;
            }
        }
    }

    finish_prune(
        dst,
        a,
        an,
        owner,
        changed,
        new_data_map,
        new_node_map,
        entries,
        children,
    )
}

// ---------------------------------------------------------------------------
// filter_all
// ---------------------------------------------------------------------------

/// Keeps only the entries of subtree `a` satisfying `pred`.
pub fn filter_all_recursive<K, V, S, P>(
    store: &mut S,
    a: Idx<Node<K, V>>,
    owner: u64,
    bulk: &mut BulkChangeEvent,
    pred: &mut P,
) -> PruneOutcome<K, V>
where
    K: Clone,
    V: Clone,
    S: ChampStore<K, V>,
    P: FnMut(&K, &V) -> bool,
{
    let an = *store.get_node(a);

    match an {
        Node::Inner {
            data_map,
            node_map,
            data_start,
            children_start,
            ..
        } => {
            let mut new_data_map = 0_u32;
            let mut new_node_map = 0_u32;
            let mut entries: Vec<Entry<K, V>> = Vec::new();
            let mut children: Vec<Idx<Node<K, V>>> = Vec::new();
            let mut changed = false;

            let mut rem = data_map | node_map;
            while rem != 0 {
                let bit = rem & rem.wrapping_neg();
                rem &= rem - 1;

                if data_map & bit != 0 {
                    let ea_idx = node::offset(data_start, node::index(data_map, bit));
                    let keep = {
                        let e = store.get_entry(ea_idx);
                        pred(&e.key, &e.value)
                    };
                    if keep {
                        new_data_map |= bit;
                        entries.push(clone_entry(store, ea_idx));
                    } else {
                        bulk.removed += 1;
                        changed = true;
                    }
                } else {
                    let ac = *store.get_child(node::offset(children_start, node::index(node_map, bit)));
                    let outcome = filter_all_recursive(store, ac, owner, bulk, pred);
                    changed |= outcome.changed;
                    match outcome.node {
                        MergeOutcome::Empty => {}
                        MergeOutcome::Single(e) => {
                            new_data_map |= bit;
                            entries.push(e);
                        }
                        MergeOutcome::Node(n) => {
                            new_node_map |= bit;
                            children.push(n);
                        }
                    }
                }
            }

            finish_prune(
                store,
                a,
                an,
                owner,
                changed,
                new_data_map,
                new_node_map,
                entries,
                children,
            )
        }
        Node::Collision {
            hash,
            entries_start,
            entries_len,
            ..
        } => {
            let len = usize::from(entries_len);
            let mut out: Vec<Entry<K, V>> = Vec::with_capacity(len);
            let mut changed = false;
            for i in 0..len {
                let keep = {
                    let e = store.get_entry(node::offset(entries_start, i));
                    pred(&e.key, &e.value)
                };
                if keep {
                    out.push(clone_entry(store, node::offset(entries_start, i)));
                } else {
                    bulk.removed += 1;
                    changed = true;
                }
            }
            finish_prune_collision(store, a, an, owner, changed, hash, out)
        }
    }
}

// ---------------------------------------------------------------------------
// Shared tails
// ---------------------------------------------------------------------------

/// Clones the single inline entry of a node accepted by `should_inline`.
fn single_entry_of<K, V, S>(store: &S, node: &Node<K, V>) -> Entry<K, V>
where
    K: Clone,
    V: Clone,
    S: ChampStore<K, V>,
{
    match *node {
        Node::Inner { data_start, .. } => clone_entry(store, data_start),
        Node::Collision { .. } => unreachable!("collision nodes are never inlined"),
    }
}

/// Re-classifies a pruned inner node by its surviving arity and writes it.
#[allow(clippy::too_many_arguments)]
fn finish_prune<K, V, S>(
    store: &mut S,
    a: Idx<Node<K, V>>,
    an: Node<K, V>,
    owner: u64,
    changed: bool,
    new_data_map: u32,
    new_node_map: u32,
    mut entries: Vec<Entry<K, V>>,
    children: Vec<Idx<Node<K, V>>>,
) -> PruneOutcome<K, V>
where
    S: ChampStore<K, V>,
{
    if !changed {
        return PruneOutcome {
            node: MergeOutcome::Node(a),
            changed: false,
        };
    }
    if new_data_map == 0 && new_node_map == 0 {
        return PruneOutcome {
            node: MergeOutcome::Empty,
            changed: true,
        };
    }
    if new_node_map == 0 && new_data_map.is_power_of_two() {
        let e = entries.pop().expect("one surviving entry");
        return PruneOutcome {
            node: MergeOutcome::Single(e),
            changed: true,
        };
    }
    let new_data = alloc_or_sentinel(store.alloc_entries(entries));
    let new_children = alloc_or_sentinel(store.alloc_children(children));
    let node = write_inner(
        store,
        a,
        an,
        owner,
        new_data_map,
        new_node_map,
        new_data,
        new_children,
    );
    PruneOutcome {
        node: MergeOutcome::Node(node),
        changed: true,
    }
}

/// Re-classifies a pruned collision node by its surviving arity.
fn finish_prune_collision<K, V, S>(
    store: &mut S,
    a: Idx<Node<K, V>>,
    an: Node<K, V>,
    owner: u64,
    changed: bool,
    hash: u32,
    mut out: Vec<Entry<K, V>>,
) -> PruneOutcome<K, V>
where
    S: ChampStore<K, V>,
{
    if !changed {
        return PruneOutcome {
            node: MergeOutcome::Node(a),
            changed: false,
        };
    }
    match out.len() {
        0 => PruneOutcome {
            node: MergeOutcome::Empty,
            changed: true,
        },
        1 => PruneOutcome {
            node: MergeOutcome::Single(out.pop().expect("one surviving entry")),
            changed: true,
        },
        len => {
            let new_len = u8::try_from(len).expect("collision node overflow (>255 entries)");
            let new_start = store.alloc_entries(out).expect("non-empty");
            let node = write_collision(store, a, an, owner, hash, new_start, new_len);
            PruneOutcome {
                node: MergeOutcome::Node(node),
                changed: true,
            }
        }
    }
}

/// Which membership rule a collision-node prune applies.
enum PruneKind {
    /// Drop entries whose key exists on the other side.
    Remove,
    /// Keep only entries whose key exists on the other side.
    Retain,
}

/// Linear `remove_all`/`retain_all` over two collision nodes.
#[allow(clippy::too_many_arguments)]
fn prune_collision<K, V, SD, SS>(
    dst: &mut SD,
    src: &SS,
    a: Idx<Node<K, V>>,
    an: Node<K, V>,
    bn: Node<K, V>,
    owner: u64,
    bulk: &mut BulkChangeEvent,
    kind: PruneKind,
) -> PruneOutcome<K, V>
where
    K: Eq + Clone,
    V: Clone,
    SD: ChampStore<K, V>,
    SS: ChampStore<K, V>,
{
    let (
        Node::Collision {
            hash: ah,
            entries_start,
            entries_len,
            ..
        },
        Node::Collision {
            entries_start: b_entries_start,
            entries_len: b_entries_len,
            ..
        },
    ) = (an, bn)
    else {
        unreachable!("collision node above max depth");
    };

    let mut out: Vec<Entry<K, V>> = Vec::new();
    let mut changed = false;
    for i in 0..usize::from(entries_len) {
        let in_other = {
            let ea = dst.get_entry(node::offset(entries_start, i));
            (0..usize::from(b_entries_len))
                .any(|j| src.get_entry(node::offset(b_entries_start, j)).key == ea.key)
        };
        let keep = match kind {
            PruneKind::Remove => !in_other,
            PruneKind::Retain => in_other,
        };
        if keep {
            if in_other {
                bulk.in_both += 1;
            }
            out.push(clone_entry(dst, node::offset(entries_start, i)));
        } else {
            bulk.removed += 1;
            changed = true;
        }
    }
    finish_prune_collision(dst, a, an, owner, changed, ah, out)
}
