//! Iterator types for CHAMP tries.
//!
//! Iteration keeps a stack of per-node cursors rather than collecting
//! entries up front, so creating an iterator is O(depth) and advancing it
//! is amortized O(1). Forward order visits a node's inline entries in
//! bitmap order and then descends into its children in bitmap order;
//! [`RevIter`] yields the exact reverse sequence.

use safe_bump::Idx;

use crate::node::{self, Entry, Node};
use crate::store::ChampStore;

/// Cursor into one node on the traversal stack.
struct Frame<K, V> {
    node: Idx<Node<K, V>>,
    /// Next inline entry (forward) / entries left to yield (reverse).
    data_pos: usize,
    /// Next child (forward) / children left to descend (reverse).
    child_pos: usize,
}

/// Base of a node's inline-entry block.
const fn entries_base<K, V>(node: &Node<K, V>) -> Idx<Entry<K, V>> {
    match *node {
        Node::Inner { data_start, .. } => data_start,
        Node::Collision { entries_start, .. } => entries_start,
    }
}

// ---------------------------------------------------------------------------
// Forward iteration
// ---------------------------------------------------------------------------

/// Iterator over references to key-value pairs, in trie order.
pub struct Iter<'a, K, V, S> {
    store: &'a S,
    stack: Vec<Frame<K, V>>,
    remaining: usize,
}

impl<'a, K, V, S: ChampStore<K, V>> Iter<'a, K, V, S> {
    /// Creates an iterator rooted at `root` over `len` entries.
    #[must_use]
    pub fn new(store: &'a S, root: Option<Idx<Node<K, V>>>, len: usize) -> Self {
        let mut stack = Vec::with_capacity(node::MAX_DEPTH + 1);
        if let Some(idx) = root {
            stack.push(Frame {
                node: idx,
                data_pos: 0,
                child_pos: 0,
            });
        }
        Self {
            store,
            stack,
            remaining: len,
        }
    }
}

impl<'a, K: 'a, V: 'a, S: ChampStore<K, V>> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let store = self.store;
        loop {
            let frame = self.stack.last_mut()?;
            let this = store.get_node(frame.node);
            if frame.data_pos < this.data_len() {
                let entry = store.get_entry(node::offset(entries_base(this), frame.data_pos));
                frame.data_pos += 1;
                self.remaining -= 1;
                return Some((&entry.key, &entry.value));
            }
            if frame.child_pos < this.children_len() {
                let children_start = match *this {
                    Node::Inner { children_start, .. } => children_start,
                    Node::Collision { .. } => unreachable!("collision nodes have no children"),
                };
                let child = *store.get_child(node::offset(children_start, frame.child_pos));
                frame.child_pos += 1;
                self.stack.push(Frame {
                    node: child,
                    data_pos: 0,
                    child_pos: 0,
                });
                continue;
            }
            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: 'a, V: 'a, S: ChampStore<K, V>> ExactSizeIterator for Iter<'a, K, V, S> {}

impl<'a, K: 'a, V: 'a, S: ChampStore<K, V>> std::iter::FusedIterator for Iter<'a, K, V, S> {}

// ---------------------------------------------------------------------------
// Reverse iteration
// ---------------------------------------------------------------------------

/// Iterator over references to key-value pairs, in reverse trie order.
///
/// Visits a node's children last-to-first before its inline entries
/// last-to-first, yielding exactly the reverse of [`Iter`].
pub struct RevIter<'a, K, V, S> {
    store: &'a S,
    stack: Vec<Frame<K, V>>,
    remaining: usize,
}

impl<'a, K, V, S: ChampStore<K, V>> RevIter<'a, K, V, S> {
    /// Creates a reverse iterator rooted at `root` over `len` entries.
    #[must_use]
    pub fn new(store: &'a S, root: Option<Idx<Node<K, V>>>, len: usize) -> Self {
        let mut iter = Self {
            store,
            stack: Vec::with_capacity(node::MAX_DEPTH + 1),
            remaining: len,
        };
        if let Some(idx) = root {
            iter.push(idx);
        }
        iter
    }

    /// Pushes a frame with cursors at the node's end.
    fn push(&mut self, idx: Idx<Node<K, V>>) {
        let this = self.store.get_node(idx);
        self.stack.push(Frame {
            node: idx,
            data_pos: this.data_len(),
            child_pos: this.children_len(),
        });
    }
}

impl<'a, K: 'a, V: 'a, S: ChampStore<K, V>> Iterator for RevIter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let store = self.store;
        loop {
            let frame = self.stack.last_mut()?;
            let this = store.get_node(frame.node);
            if frame.child_pos > 0 {
                frame.child_pos -= 1;
                let children_start = match *this {
                    Node::Inner { children_start, .. } => children_start,
                    Node::Collision { .. } => unreachable!("collision nodes have no children"),
                };
                let child = *store.get_child(node::offset(children_start, frame.child_pos));
                self.push(child);
                continue;
            }
            if frame.data_pos > 0 {
                frame.data_pos -= 1;
                let entry = store.get_entry(node::offset(entries_base(this), frame.data_pos));
                self.remaining -= 1;
                return Some((&entry.key, &entry.value));
            }
            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: 'a, V: 'a, S: ChampStore<K, V>> ExactSizeIterator for RevIter<'a, K, V, S> {}

impl<'a, K: 'a, V: 'a, S: ChampStore<K, V>> std::iter::FusedIterator for RevIter<'a, K, V, S> {}
