//! Insertion-ordered overlay over [`Trie`].
//!
//! [`SequencedTrie`] pairs a trie with a side vector recording insertion
//! order. Each stored value carries a sequence number; the live element
//! with sequence number `s` sits at vector index `s + offset`. Removing an
//! interior element writes a tombstone instead of shifting the tail, with
//! run lengths kept on the run boundaries so iteration skips a whole run
//! in one step. A full renumbering pass runs only when tombstone density
//! or sequence-number range make the cheap path unsafe.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;

use crate::change::ChangeEvent;
use crate::trace::{debug_log, trace_log};
use crate::trie::Trie;

/// A value tagged with its position in insertion order.
///
/// Key hashing and lookup never see the sequence number — it lives on the
/// value side of the trie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequenced<V> {
    /// Position in insertion order, offset-adjusted into the side vector.
    pub seq: i32,
    /// The user value.
    pub value: V,
}

/// One slot of the insertion-order vector.
enum VecSlot<K> {
    /// A live key at this position.
    Live(K),
    /// A removed position. `before`/`after` are run lengths and are only
    /// meaningful on the first (`after`) and last (`before`) slot of a
    /// tombstone run.
    Tomb { before: usize, after: usize },
}

/// Returns `true` when the order vector needs a full renumbering pass:
/// the trie emptied, tombstones outnumber live elements, or the sequence
/// numbering is within 2 of the representable range on either end.
#[allow(clippy::cast_possible_wrap)]
fn must_renumber(size: usize, offset: i32, vec_len: usize) -> bool {
    size == 0
        || vec_len >> 1 > size
        || vec_len as i64 - i64::from(offset) > i64::from(i32::MAX) - 2
        || i64::from(offset) < i64::from(i32::MIN) + 2
}

/// Hash map that iterates in insertion order.
///
/// Re-inserting an existing key updates its value but keeps its position;
/// removing and inserting it again moves it to the end.
pub struct SequencedTrie<K, V> {
    trie: Trie<K, Sequenced<V>>,
    vec: VecDeque<VecSlot<K>>,
    /// Sequence number `s` lives at vector index `s + offset`. Only front
    /// trims move it, so it never increases from zero.
    offset: i32,
}

impl<K, V> SequencedTrie<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            trie: Trie::new(),
            vec: VecDeque::new(),
            offset: 0,
        }
    }

    /// Returns the number of key-value pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.trie.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Read operations
// ---------------------------------------------------------------------------

impl<K: Hash + Eq, V> SequencedTrie<K, V> {
    /// Returns a reference to the value associated with `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.trie.get(key).map(|s| &s.value)
    }

    /// Returns `true` if the map contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.trie.contains_key(key)
    }

    /// Returns the first entry in insertion order.
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.iter().next()
    }

    /// Returns the last entry in insertion order.
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.iter_rev().next()
    }

    /// Returns an iterator over `(&K, &V)` pairs in insertion order.
    #[must_use]
    pub fn iter(&self) -> SeqIter<'_, K, V> {
        SeqIter {
            map: self,
            pos: 0,
            remaining: self.len(),
        }
    }

    /// Returns an iterator over `(&K, &V)` pairs in reverse insertion
    /// order.
    #[must_use]
    pub fn iter_rev(&self) -> SeqRevIter<'_, K, V> {
        SeqRevIter {
            map: self,
            pos: self.vec.len(),
            remaining: self.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Write operations
// ---------------------------------------------------------------------------

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> SequencedTrie<K, V> {
    /// Sequence number for the next appended element. `must_renumber`
    /// keeps the numbering at least 2 away from the `i32` range ends.
    #[allow(clippy::cast_possible_wrap)]
    fn next_seq(&self) -> i32 {
        i32::try_from(self.vec.len() as i64 - i64::from(self.offset))
            .expect("sequence range exhausted")
    }

    /// Vector index of a live sequence number.
    fn slot_index(&self, seq: i32) -> usize {
        usize::try_from(i64::from(seq) + i64::from(self.offset)).expect("live sequence index")
    }

    /// Inserts a key-value pair.
    ///
    /// A new key is appended at the end of the order; an existing key
    /// keeps its position and only its value is updated.
    pub fn insert(&mut self, key: K, value: V) -> ChangeEvent<V> {
        let seq = self.next_seq();
        let change = self.trie.insert_with(
            key.clone(),
            Sequenced { seq, value },
            |old, new| Sequenced {
                seq: old.seq,
                value: new.value.clone(),
            },
        );
        let change = match change {
            ChangeEvent::Added => {
                self.vec.push_back(VecSlot::Live(key));
                ChangeEvent::Added
            }
            ChangeEvent::Replaced { old } => ChangeEvent::Replaced { old: old.value },
            ChangeEvent::Unchanged => ChangeEvent::Unchanged,
            ChangeEvent::Removed { .. } => unreachable!("insert reported a removal"),
        };
        if must_renumber(self.trie.len(), self.offset, self.vec.len()) {
            self.renumber();
        }
        change
    }

    /// Removes a key from the map.
    pub fn remove(&mut self, key: &K) -> ChangeEvent<V> {
        match self.trie.remove(key) {
            ChangeEvent::Removed { old } => {
                let index = self.slot_index(old.seq);
                self.vec_remove(index);
                if must_renumber(self.trie.len(), self.offset, self.vec.len()) {
                    self.renumber();
                }
                ChangeEvent::Removed { old: old.value }
            }
            _ => ChangeEvent::Unchanged,
        }
    }

    /// Drops the vector slot at `index`, which must hold a live key.
    ///
    /// End positions trim the vector together with the adjacent tombstone
    /// run; interior positions become a tombstone merged with both
    /// neighboring runs by rewriting the run-boundary lengths, O(1).
    #[allow(clippy::option_if_let_else)]
    fn vec_remove(&mut self, index: usize) {
        debug_assert!(matches!(self.vec[index], VecSlot::Live(_)));
        if index == 0 {
            self.vec.pop_front();
            let run = match self.vec.front() {
                Some(VecSlot::Tomb { after, .. }) => *after,
                _ => 0,
            };
            self.vec.drain(..run);
            // Every surviving slot moved left; keep `seq + offset` valid.
            self.offset -= i32::try_from(run + 1).expect("vector length fits i32");
        } else if index + 1 == self.vec.len() {
            self.vec.pop_back();
            let run = match self.vec.back() {
                Some(VecSlot::Tomb { before, .. }) => *before,
                _ => 0,
            };
            self.vec.truncate(self.vec.len() - run);
        } else {
            let left = match self.vec[index - 1] {
                VecSlot::Tomb { before, .. } => before,
                VecSlot::Live(_) => 0,
            };
            let right = match self.vec[index + 1] {
                VecSlot::Tomb { after, .. } => after,
                VecSlot::Live(_) => 0,
            };
            let run = left + right + 1;
            self.vec[index] = VecSlot::Tomb {
                before: run,
                after: run,
            };
            match &mut self.vec[index - left] {
                VecSlot::Tomb { after, .. } => *after = run,
                VecSlot::Live(_) => unreachable!("tombstone run boundary"),
            }
            match &mut self.vec[index + right] {
                VecSlot::Tomb { before, .. } => *before = run,
                VecSlot::Live(_) => unreachable!("tombstone run boundary"),
            }
            trace_log!(run, "merged tombstone runs");
        }
    }

    /// Rebuilds the order vector tombstone-free and reassigns sequence
    /// numbers `0..len`, rewriting every trie entry through a transient
    /// session. Hash placement is unaffected since keys do not change.
    fn renumber(&mut self) {
        let len = self.trie.len();
        let mut new_vec = VecDeque::with_capacity(len);
        let mut new_trie = Trie::new();
        {
            let mut session = new_trie.transient();
            let mut seq = 0_i32;
            let mut pos = 0;
            while pos < self.vec.len() {
                match &self.vec[pos] {
                    VecSlot::Live(key) => {
                        let value = self
                            .trie
                            .get(key)
                            .expect("order vector references a live key")
                            .value
                            .clone();
                        session.insert(key.clone(), Sequenced { seq, value });
                        new_vec.push_back(VecSlot::Live(key.clone()));
                        seq += 1;
                        pos += 1;
                    }
                    VecSlot::Tomb { after, .. } => pos += after,
                }
            }
        }
        debug_log!(
            live = len,
            dropped = self.vec.len() - len,
            "renumbered sequence vector"
        );
        self.trie = new_trie;
        self.vec = new_vec;
        self.offset = 0;
    }
}

// ---------------------------------------------------------------------------
// Iterators
// ---------------------------------------------------------------------------

/// Iterator over a [`SequencedTrie`] in insertion order.
pub struct SeqIter<'a, K, V> {
    map: &'a SequencedTrie<K, V>,
    pos: usize,
    remaining: usize,
}

impl<'a, K: Hash + Eq, V> Iterator for SeqIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let map = self.map;
        while self.pos < map.vec.len() {
            match &map.vec[self.pos] {
                VecSlot::Live(key) => {
                    self.pos += 1;
                    self.remaining -= 1;
                    let value = &map.trie.get(key).expect("order vector references a live key").value;
                    return Some((key, value));
                }
                VecSlot::Tomb { after, .. } => self.pos += after,
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Hash + Eq, V> ExactSizeIterator for SeqIter<'_, K, V> {}

impl<K: Hash + Eq, V> std::iter::FusedIterator for SeqIter<'_, K, V> {}

/// Iterator over a [`SequencedTrie`] in reverse insertion order.
pub struct SeqRevIter<'a, K, V> {
    map: &'a SequencedTrie<K, V>,
    /// Exclusive upper bound; all live slots at `pos..` were yielded.
    pos: usize,
    remaining: usize,
}

impl<'a, K: Hash + Eq, V> Iterator for SeqRevIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let map = self.map;
        while self.pos > 0 {
            match &map.vec[self.pos - 1] {
                VecSlot::Live(key) => {
                    self.pos -= 1;
                    self.remaining -= 1;
                    let value = &map.trie.get(key).expect("order vector references a live key").value;
                    return Some((key, value));
                }
                VecSlot::Tomb { before, .. } => self.pos -= before,
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Hash + Eq, V> ExactSizeIterator for SeqRevIter<'_, K, V> {}

impl<K: Hash + Eq, V> std::iter::FusedIterator for SeqRevIter<'_, K, V> {}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<K, V> Default for SequencedTrie<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for SequencedTrie<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencedTrie")
            .field("len", &self.len())
            .field("vec_len", &self.vec.len())
            .finish_non_exhaustive()
    }
}

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> Extend<(K, V)> for SequencedTrie<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone + PartialEq> FromIterator<(K, V)> for SequencedTrie<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K: Hash + Eq, V> IntoIterator for &'a SequencedTrie<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = SeqIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
