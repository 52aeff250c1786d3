//! Positional task index.

use crate::error::{Error, Result};

/// Maps 1-based display positions to store keys.
///
/// An index is a snapshot of the active tasks, in ascending key order, at
/// the moment it was built. It is not updated by later writes: a task added
/// after the snapshot has no position until the index is rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskIndex {
    keys: Vec<u64>,
}

impl TaskIndex {
    /// Build an index from keys already in ascending order.
    #[must_use]
    pub const fn from_keys(keys: Vec<u64>) -> Self {
        Self { keys }
    }

    /// Number of positions in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the index holds no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The indexed keys, position 1 first.
    #[must_use]
    pub fn keys(&self) -> &[u64] {
        &self.keys
    }

    /// Resolve a 1-based position to its store key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PositionOutOfRange`] for position 0 or any position
    /// past the end of the index.
    pub fn resolve(&self, position: usize) -> Result<u64> {
        position
            .checked_sub(1)
            .and_then(|i| self.keys.get(i).copied())
            .ok_or(Error::PositionOutOfRange { position, count: self.keys.len() })
    }

    pub(crate) fn push(&mut self, key: u64) {
        self.keys.push(key);
    }
}

/// Parse a position argument as a decimal integer.
///
/// Range is not checked here; see [`TaskIndex::resolve`].
///
/// # Errors
///
/// Returns [`Error::InvalidPosition`] if `arg` is not a non-negative
/// decimal integer.
pub fn parse_position(arg: &str) -> Result<usize> {
    arg.parse::<usize>().map_err(|_| Error::InvalidPosition(arg.to_string()))
}
