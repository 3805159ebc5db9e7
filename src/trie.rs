//! Single-threaded CHAMP trie map.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops;

use safe_bump::Idx;

use crate::arena::ChampArena;
use crate::change::{BulkChangeEvent, ChangeEvent};
use crate::iter::{Iter, RevIter};
use crate::node::{self, Entry, NO_OWNER, Node};
use crate::ops::bulk::{
    MergeOutcome, filter_all_recursive, graft_recursive, put_all_recursive, remove_all_recursive,
    retain_all_recursive,
};
use crate::ops::compare::equivalent_recursive;
use crate::ops::get::get_recursive;
use crate::ops::insert::insert_recursive;
use crate::ops::remove::{RemoveOutcome, remove_recursive};
use crate::store::{ChampStore, StoreCheckpoint};
use crate::trace::debug_log;

/// Hashes a key to the 32-bit value the trie consumes in 5-bit fragments.
///
/// The standard 64-bit hash is folded by xoring its halves so both
/// contribute to every fragment.
pub fn hash_of<K: Hash + ?Sized>(key: &K) -> u32 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let h = hasher.finish();
    #[allow(clippy::cast_possible_truncation)]
    {
        (h ^ (h >> 32)) as u32
    }
}

/// Saved trie state for rollback and point-in-time reads.
///
/// Created by [`Trie::checkpoint`]. Arenas only grow between checkpoints,
/// so a checkpoint stays readable via [`Trie::get_at`] and
/// [`Trie::iter_at`] until a rollback to an earlier point discards it.
pub struct TrieCheckpoint<K, V> {
    store: StoreCheckpoint<K, V>,
    root: Option<Idx<Node<K, V>>>,
    size: usize,
}

// TrieCheckpoint contains only indices and primitives — no actual K/V data.

impl<K, V> Clone for TrieCheckpoint<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for TrieCheckpoint<K, V> {}

/// Persistent hash map based on a CHAMP trie, single-threaded.
///
/// The same set of key-value pairs always produces the same trie structure
/// (canonical form), so structural equality can compare tries node by node
/// without ordering concerns. Every mutation reports what it did via
/// [`ChangeEvent`] or [`BulkChangeEvent`].
pub struct Trie<K, V> {
    store: ChampArena<K, V>,
    root: Option<Idx<Node<K, V>>>,
    size: usize,
    /// Last owner stamp handed out; `0` is reserved for [`NO_OWNER`].
    owner_counter: u64,
}

// ---------------------------------------------------------------------------
// Construction & accessors — no trait bounds
// ---------------------------------------------------------------------------

impl<K, V> Trie<K, V> {
    /// Creates an empty trie.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            store: ChampArena::new(),
            root: None,
            size: 0,
            owner_counter: NO_OWNER,
        }
    }

    /// Returns the number of key-value pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the trie contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Saves the current trie state for later rollback or point-in-time
    /// reads.
    #[must_use]
    pub fn checkpoint(&self) -> TrieCheckpoint<K, V> {
        TrieCheckpoint {
            store: self.store.checkpoint(),
            root: self.root,
            size: self.size,
        }
    }

    /// Restores the trie to a previously saved checkpoint.
    ///
    /// All changes made after the checkpoint are discarded; checkpoints
    /// taken after `cp` become invalid.
    pub fn rollback(&mut self, cp: TrieCheckpoint<K, V>) {
        self.store.rollback(cp.store);
        self.root = cp.root;
        self.size = cp.size;
    }

    /// Returns the total number of allocated items in each arena:
    /// `(nodes, entries, children)`.
    ///
    /// Includes superseded node versions — reflects true memory footprint.
    #[must_use]
    pub fn arena_len(&self) -> (usize, usize, usize) {
        self.store.arena_len()
    }

    /// Mints a fresh owner stamp for a mutation session.
    const fn mint_owner(&mut self) -> u64 {
        self.owner_counter += 1;
        self.owner_counter
    }
}

// ---------------------------------------------------------------------------
// Read operations — K: Hash + Eq
// ---------------------------------------------------------------------------

impl<K: Hash + Eq, V> Trie<K, V> {
    /// Returns a reference to the value associated with `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let root = self.root?;
        get_recursive(&self.store, root, hash_of(key), key, 0)
    }

    /// Returns `true` if the trie contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Looks up `key` in the state captured by `cp`.
    ///
    /// # Panics
    ///
    /// May panic if `cp` was invalidated by a rollback to an earlier point.
    #[must_use]
    pub fn get_at<'a>(&'a self, cp: &TrieCheckpoint<K, V>, key: &K) -> Option<&'a V> {
        let root = cp.root?;
        get_recursive(&self.store, root, hash_of(key), key, 0)
    }
}

// ---------------------------------------------------------------------------
// Write operations
// ---------------------------------------------------------------------------

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> Trie<K, V> {
    /// Inserts a key-value pair, replacing any existing value.
    ///
    /// Reports [`ChangeEvent::Unchanged`] when the key was already mapped
    /// to an equal value, leaving the trie untouched.
    pub fn insert(&mut self, key: K, value: V) -> ChangeEvent<V> {
        self.insert_with(key, value, |_old, new| new.clone())
    }

    /// Inserts a key-value pair, combining with any existing value.
    ///
    /// On a key already present, the stored value becomes
    /// `update(&old, &new)`; an update equal to the old value reports
    /// [`ChangeEvent::Unchanged`].
    pub fn insert_with<F>(&mut self, key: K, value: V, update: F) -> ChangeEvent<V>
    where
        F: FnMut(&V, &V) -> V,
    {
        self.insert_inner(key, value, update, NO_OWNER)
    }

    fn insert_inner<F>(&mut self, key: K, value: V, mut update: F, owner: u64) -> ChangeEvent<V>
    where
        F: FnMut(&V, &V) -> V,
    {
        let hash = hash_of(&key);
        let entry = Entry { hash, key, value };

        if let Some(root) = self.root {
            let outcome = insert_recursive(&mut self.store, root, entry, 0, owner, &mut update);
            self.root = Some(outcome.node);
            if matches!(outcome.change, ChangeEvent::Added) {
                self.size += 1;
            }
            outcome.change
        } else {
            self.root = Some(alloc_single_root(&mut self.store, entry, owner));
            self.size = 1;
            ChangeEvent::Added
        }
    }

    /// Starts a transient mutation session.
    ///
    /// Nodes created during the session carry a fresh owner stamp and are
    /// rewritten in place on subsequent edits instead of being copied,
    /// batching many mutations without intermediate garbage. States
    /// captured before the session (via [`Trie::checkpoint`]) are never
    /// touched.
    pub fn transient(&mut self) -> Transient<'_, K, V> {
        let owner = self.mint_owner();
        Transient { trie: self, owner }
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Trie<K, V> {
    /// Removes a key from the trie.
    ///
    /// Reports [`ChangeEvent::Removed`] with the old value, or
    /// [`ChangeEvent::Unchanged`] if the key was not present.
    pub fn remove(&mut self, key: &K) -> ChangeEvent<V> {
        self.remove_inner(key, NO_OWNER)
    }

    fn remove_inner(&mut self, key: &K, owner: u64) -> ChangeEvent<V> {
        let Some(root) = self.root else {
            return ChangeEvent::Unchanged;
        };
        let hash = hash_of(key);
        match remove_recursive(&mut self.store, root, hash, key, 0, owner) {
            RemoveOutcome::NotFound => ChangeEvent::Unchanged,
            RemoveOutcome::Removed { node, old } => {
                self.root = node;
                self.size -= 1;
                ChangeEvent::Removed { old }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Bulk set algebra
// ---------------------------------------------------------------------------

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> Trie<K, V> {
    /// Merges all entries of `other` into `self`, keeping `other`'s value
    /// on keys present in both.
    pub fn put_all(&mut self, other: &Self) -> BulkChangeEvent {
        self.put_all_with(other, |_ours, theirs| theirs.clone())
    }

    /// Merges all entries of `other` into `self`.
    ///
    /// Keys present in both resolve to `update(&ours, &theirs)`. Subtrees
    /// present only in `other` are grafted structurally — no per-element
    /// re-insertion. Merging a trie with an equal one leaves the root
    /// index untouched.
    pub fn put_all_with<F>(&mut self, other: &Self, mut update: F) -> BulkChangeEvent
    where
        F: FnMut(&V, &V) -> V,
    {
        let mut bulk = BulkChangeEvent::default();
        let Some(b) = other.root else {
            return bulk;
        };
        let owner = self.mint_owner();
        if let Some(a) = self.root {
            let outcome = put_all_recursive(
                &mut self.store,
                &other.store,
                a,
                b,
                0,
                owner,
                &mut bulk,
                &mut update,
            );
            self.root = Some(outcome.node);
        } else {
            self.root = Some(graft_recursive(&mut self.store, &other.store, b, owner));
        }
        self.size = self.size + other.size - bulk.in_both;
        debug_log!(
            in_both = bulk.in_both,
            replaced = bulk.replaced,
            "put_all merged tries"
        );
        bulk
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Trie<K, V> {
    /// Removes every key of `other` from `self` (set difference).
    ///
    /// Matching is by key equality only; the values in `other` are ignored.
    pub fn remove_all(&mut self, other: &Self) -> BulkChangeEvent {
        let mut bulk = BulkChangeEvent::default();
        let (Some(a), Some(b)) = (self.root, other.root) else {
            return bulk;
        };
        let owner = self.mint_owner();
        let outcome = remove_all_recursive(
            &mut self.store,
            &other.store,
            a,
            b,
            0,
            owner,
            &mut bulk,
        );
        self.apply_prune(outcome.node, outcome.changed, owner);
        self.size -= bulk.removed;
        bulk
    }

    /// Keeps only the keys of `self` that are also present in `other`
    /// (set intersection). Values are taken from `self`.
    pub fn retain_all(&mut self, other: &Self) -> BulkChangeEvent {
        let mut bulk = BulkChangeEvent::default();
        let Some(a) = self.root else {
            return bulk;
        };
        let owner = self.mint_owner();
        let Some(b) = other.root else {
            // Intersection with the empty trie.
            bulk.removed = self.size;
            self.root = None;
            self.size = 0;
            return bulk;
        };
        let outcome = retain_all_recursive(
            &mut self.store,
            &other.store,
            a,
            b,
            0,
            owner,
            &mut bulk,
        );
        self.apply_prune(outcome.node, outcome.changed, owner);
        self.size -= bulk.removed;
        bulk
    }

    /// Keeps only the entries satisfying `pred`.
    pub fn filter_all<P>(&mut self, mut pred: P) -> BulkChangeEvent
    where
        P: FnMut(&K, &V) -> bool,
    {
        let mut bulk = BulkChangeEvent::default();
        let Some(a) = self.root else {
            return bulk;
        };
        let owner = self.mint_owner();
        let outcome = filter_all_recursive(&mut self.store, a, owner, &mut bulk, &mut pred);
        self.apply_prune(outcome.node, outcome.changed, owner);
        self.size -= bulk.removed;
        bulk
    }

    /// Installs the result of a pruning bulk operation as the new root.
    ///
    /// A subtree reduced to one entry is re-expanded into a single-entry
    /// root node, since the root is the one node allowed below arity two.
    fn apply_prune(&mut self, node: MergeOutcome<K, V>, changed: bool, owner: u64) {
        if !changed {
            return;
        }
        self.root = match node {
            MergeOutcome::Empty => None,
            MergeOutcome::Single(e) => Some(alloc_single_root(&mut self.store, e, owner)),
            MergeOutcome::Node(n) => Some(n),
        };
    }
}

/// Allocates a root node holding exactly one inline entry.
fn alloc_single_root<K, V, S: ChampStore<K, V>>(
    store: &mut S,
    entry: Entry<K, V>,
    owner: u64,
) -> Idx<Node<K, V>> {
    let bit = node::mask(node::fragment(entry.hash, 0));
    let data_start = store
        .alloc_entries(std::iter::once(entry))
        .expect("single entry");
    store.alloc_node(Node::Inner {
        data_map: bit,
        node_map: 0,
        data_start,
        children_start: Idx::from_raw(0),
        owner,
    })
}

// ---------------------------------------------------------------------------
// Iteration
// ---------------------------------------------------------------------------

impl<K, V> Trie<K, V> {
    /// Returns an iterator over `(&K, &V)` pairs in trie order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V, ChampArena<K, V>> {
        Iter::new(&self.store, self.root, self.size)
    }

    /// Returns an iterator over `(&K, &V)` pairs in reverse trie order.
    #[must_use]
    pub fn iter_rev(&self) -> RevIter<'_, K, V, ChampArena<K, V>> {
        RevIter::new(&self.store, self.root, self.size)
    }

    /// Iterates over the state captured by `cp`.
    ///
    /// # Panics
    ///
    /// May panic if `cp` was invalidated by a rollback to an earlier point.
    #[must_use]
    pub fn iter_at(&self, cp: &TrieCheckpoint<K, V>) -> Iter<'_, K, V, ChampArena<K, V>> {
        Iter::new(&self.store, cp.root, cp.size)
    }

    /// Returns the first entry in trie order.
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.iter().next()
    }

    /// Returns the last entry in trie order.
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.iter_rev().next()
    }
}

// ---------------------------------------------------------------------------
// Transient sessions
// ---------------------------------------------------------------------------

/// Exclusive mutation session over a [`Trie`].
///
/// Created by [`Trie::transient`]. Edits go through the same recursive
/// operations as persistent ones, but nodes allocated during this session
/// are rewritten in place on later edits, so a batch of mutations allocates
/// each path node at most once.
pub struct Transient<'a, K, V> {
    trie: &'a mut Trie<K, V>,
    owner: u64,
}

impl<K, V> Transient<'_, K, V> {
    /// Ends the session explicitly, returning the number of entries.
    ///
    /// Equivalent to dropping the guard: the owner stamp is retired either
    /// way, and nodes created during the session become immutable to every
    /// later operation.
    #[must_use]
    pub const fn commit(self) -> usize {
        self.trie.len()
    }
}

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> Transient<'_, K, V> {
    /// Inserts a key-value pair, replacing any existing value.
    pub fn insert(&mut self, key: K, value: V) -> ChangeEvent<V> {
        self.trie
            .insert_inner(key, value, |_old, new| new.clone(), self.owner)
    }

    /// Inserts a key-value pair, combining with any existing value.
    pub fn insert_with<F>(&mut self, key: K, value: V, update: F) -> ChangeEvent<V>
    where
        F: FnMut(&V, &V) -> V,
    {
        self.trie.insert_inner(key, value, update, self.owner)
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Transient<'_, K, V> {
    /// Removes a key from the trie.
    pub fn remove(&mut self, key: &K) -> ChangeEvent<V> {
        self.trie.remove_inner(key, self.owner)
    }
}

impl<K: Hash + Eq, V> Transient<'_, K, V> {
    /// Returns a reference to the value associated with `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.trie.get(key)
    }

    /// Returns the number of key-value pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.trie.len()
    }

    /// Returns `true` if the trie contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }
}

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> Extend<(K, V)> for Transient<'_, K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

#[cfg(test)]
impl<K, V> Trie<K, V> {
    /// Backing store and root index, for structural checks in tests.
    #[must_use]
    pub const fn storage(&self) -> (&ChampArena<K, V>, Option<Idx<Node<K, V>>>) {
        (&self.store, self.root)
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<K, V> Default for Trie<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for Trie<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trie")
            .field("len", &self.size)
            .finish_non_exhaustive()
    }
}

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> Extend<(K, V)> for Trie<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> FromIterator<(K, V)> for Trie<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut trie = Self::new();
        trie.extend(iter);
        trie
    }
}

impl<K: Hash + Eq, V> ops::Index<&K> for Trie<K, V> {
    type Output = V;

    fn index(&self, key: &K) -> &V {
        self.get(key).expect("key not found")
    }
}

impl<'a, K, V> IntoIterator for &'a Trie<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, ChampArena<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Eq, V: PartialEq> PartialEq for Trie<K, V> {
    /// Structural equality: canonical form makes same-contents tries have
    /// the same shape, so nodes compare pairwise without ordering concerns.
    fn eq(&self, other: &Self) -> bool {
        if self.size != other.size {
            return false;
        }
        match (self.root, other.root) {
            (None, None) => true,
            (Some(a), Some(b)) => equivalent_recursive(&self.store, a, &other.store, b),
            _ => false,
        }
    }
}

impl<K: Eq, V: Eq> Eq for Trie<K, V> {}
