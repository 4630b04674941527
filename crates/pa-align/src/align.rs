//! Character correspondence between a processed string and its source.
//!
//! `after` is assumed to be derivable from `before` by case folding and by
//! deleting characters or substituting them with single spaces, never by
//! inserting new ones. Under that assumption a greedy single pass is enough:
//!
//! 1. Walk `before` left to right with a cursor into `after`.
//! 2. An equal character is recorded and advances the cursor.
//! 3. A space in `after` may stand in for one differing `before` character;
//!    the `moved` flag stops one `before` character from satisfying two
//!    consecutive `after` spaces.
//! 4. Any other `before` character was deleted and is skipped.
//! 5. The walk stops as soon as `after` is fully consumed.
//!
//! If `before` runs out first the map is simply partial. Callers check key
//! presence through [`CorrespondenceMap::get`].

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Sparse index translation from `after` positions to `before` positions.
///
/// Entries exist for the contiguous prefix `0..len()` of `after` that the
/// walk consumed; every later position is absent. Values are strictly
/// increasing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrespondenceMap {
    targets: Vec<usize>,
    after_len: usize,
}

impl CorrespondenceMap {
    /// The `before` index recorded for `after` index `key`, if any.
    pub fn get(&self, key: usize) -> Option<usize> {
        self.targets.get(key).copied()
    }

    pub fn contains(&self, key: usize) -> bool {
        key < self.targets.len()
    }

    /// Number of keys present.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Length, in characters, of the `after` string the map was built for.
    pub fn after_len(&self) -> usize {
        self.after_len
    }

    /// `true` when every `after` position has an entry.
    pub fn is_complete(&self) -> bool {
        self.targets.len() == self.after_len
    }

    /// Present entries as `(after_index, before_index)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.targets.iter().copied().enumerate()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the correspondence from `after` character indices back to `before`
/// character indices.
///
/// Both strings must already share case; the caller folds `before` first.
pub fn build_map(before: &str, after: &str) -> CorrespondenceMap {
    let after: Vec<char> = after.chars().collect();
    let end = after.len();
    let mut targets = Vec::with_capacity(end);

    if end == 0 {
        return CorrespondenceMap { targets, after_len: 0 };
    }

    let mut i_a = 0;
    let mut moved = false;
    for (i_b, c_b) in before.chars().enumerate() {
        if c_b == after[i_a] {
            targets.push(i_b);
            i_a += 1;
            moved = false;
        } else if after[i_a] == ' ' && !moved {
            // `c_b` was replaced by this space.
            targets.push(i_b);
            i_a += 1;
            moved = true;
        }
        if i_a == end {
            break;
        }
    }

    CorrespondenceMap {
        targets,
        after_len: end,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
