//! Recursive trie operations.
//!
//! Each operation walks the trie from a root index, allocating rewritten
//! nodes into the store (or rewriting in place when the owner stamp
//! matches) and returning the index of the new subtree root.

pub mod blocks;
pub mod bulk;
pub mod compare;
pub mod get;
pub mod insert;
pub mod remove;
