//! Persistent hash map engine based on CHAMP.
//!
//! CHAMP (Compressed Hash-Array Mapped Prefix-tree) is a refined HAMT that
//! guarantees **canonical form**: the same set of key-value pairs always
//! produces the same trie structure, regardless of the operation history.
//!
//! # Key properties
//!
//! - **Canonical form**: same contents = same structure, so equality
//!   compares tries node by node without ordering concerns
//! - **COW structural sharing**: cheap snapshots, mutate-on-write
//! - **Transient sessions**: owner-stamped batch edits rewrite fresh nodes
//!   in place instead of copying ([`Trie::transient`])
//! - **Bulk set algebra**: `put_all`/`remove_all`/`retain_all`/`filter_all`
//!   walk two tries in lock-step instead of iterating elementwise
//! - **Insertion-order overlay**: [`SequencedTrie`] with a tombstone
//!   run-length vector for O(1) amortized ordered removal
//! - **Zero `unsafe`**: enforced by `#![forbid(unsafe_code)]`
//!
//! # References
//!
//! - Steindorfer & Vinju, 2015 — "Optimizing Hash-Array Mapped Tries
//!   for Fast and Lean Immutable JVM Collections", OOPSLA 2015
//! - Bagwell, 2001 — "Ideal Hash Trees"

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod change;
pub mod iter;
pub mod node;
pub mod seq;
pub mod store;

mod arena;
mod ops;
mod trace;
mod trie;

#[cfg(test)]
mod tests;

pub use arena::ChampArena;
pub use change::{BulkChangeEvent, ChangeEvent};
pub use seq::SequencedTrie;
pub use trie::{Transient, Trie, TrieCheckpoint};
