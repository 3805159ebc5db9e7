//! Out-values reporting what a mutation did.
//!
//! Operations return the (possibly identical) updated node, so callers need
//! a separate channel to learn whether anything changed and what the prior
//! value was.

/// Outcome of a single-key operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent<V> {
    /// The key was found and the value was left as-is.
    Unchanged,
    /// A new key was inserted.
    Added,
    /// An existing value was replaced.
    Replaced {
        /// The value that was replaced.
        old: V,
    },
    /// An existing entry was removed.
    Removed {
        /// The value that was removed.
        old: V,
    },
}

impl<V> ChangeEvent<V> {
    /// Returns `true` if the operation structurally changed the trie or
    /// rewrote a value.
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Returns the prior value carried by `Replaced`/`Removed`, if any.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn into_old(self) -> Option<V> {
        match self {
            Self::Replaced { old } | Self::Removed { old } => Some(old),
            Self::Unchanged | Self::Added => None,
        }
    }
}

/// Accumulators for whole-trie merge operations.
///
/// Lets the caller compute the resulting size without re-walking the
/// result: `|put_all(A, B)| = |A| + |B| - in_both`, and
/// `|remove_all/retain_all/filter_all(A, ..)| = |A| - removed`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BulkChangeEvent {
    /// Number of keys present on both sides.
    pub in_both: usize,
    /// Number of entries dropped from the receiver.
    pub removed: usize,
    /// `true` if some both-present key ended with a value different from
    /// the receiver's original.
    pub replaced: bool,
}
