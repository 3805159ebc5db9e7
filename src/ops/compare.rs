//! Structural comparison and subtree sizing.

use safe_bump::Idx;

use crate::node::{self, Node};
use crate::store::ChampStore;

/// Structural equality of two subtrees, possibly from different stores.
///
/// Ignores node identity and owner stamps: two tries holding the same
/// entries compare equal regardless of the edit history that produced
/// them. Collision entries compare as unordered multisets since their
/// block order depends on insertion order.
pub fn equivalent_recursive<K, V, SA, SB>(
    sa: &SA,
    a: Idx<Node<K, V>>,
    sb: &SB,
    b: Idx<Node<K, V>>,
) -> bool
where
    K: Eq,
    V: PartialEq,
    SA: ChampStore<K, V>,
    SB: ChampStore<K, V>,
{
    match (*sa.get_node(a), *sb.get_node(b)) {
        (
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
        ) => {
            if data_map != b_data_map || node_map != b_node_map {
                return false;
            }
            for i in 0..data_map.count_ones() as usize {
                let ea = sa.get_entry(node::offset(data_start, i));
                let eb = sb.get_entry(node::offset(b_data_start, i));
                if ea.hash != eb.hash || ea.key != eb.key || ea.value != eb.value {
                    return false;
                }
            }
            for i in 0..node_map.count_ones() as usize {
                let ca = *sa.get_child(node::offset(children_start, i));
                let cb = *sb.get_child(node::offset(b_children_start, i));
                if !equivalent_recursive(sa, ca, sb, cb) {
                    return false;
                }
            }
            true
        }
        (
            Node::Collision {
                hash,
                entries_start,
                entries_len,
                ..
            },
            Node::Collision {
                hash: b_hash,
                entries_start: b_entries_start,
                entries_len: b_entries_len,
                ..
            },
        ) => {
            if hash != b_hash || entries_len != b_entries_len {
                return false;
            }
            // Unordered comparison; collision lists are tiny.
            for i in 0..usize::from(entries_len) {
                let ea = sa.get_entry(node::offset(entries_start, i));
                let mut matched = false;
                for j in 0..usize::from(entries_len) {
                    let eb = sb.get_entry(node::offset(b_entries_start, j));
                    if ea.key == eb.key {
                        matched = ea.value == eb.value;
                        break;
                    }
                }
                if !matched {
                    return false;
                }
            }
            true
        }
        _ => false,
    }
}

/// Number of entries in the subtree rooted at `node_idx`.
pub fn size_recursive<K, V, S>(store: &S, node_idx: Idx<Node<K, V>>) -> usize
where
    S: ChampStore<K, V>,
{
    match *store.get_node(node_idx) {
        Node::Inner {
            data_map,
            node_map,
            children_start,
            ..
        } => {
            let mut total = data_map.count_ones() as usize;
            for i in 0..node_map.count_ones() as usize {
                let child = *store.get_child(node::offset(children_start, i));
                total += size_recursive(store, child);
            }
            total
        }
        Node::Collision { entries_len, .. } => usize::from(entries_len),
    }
}
