//! Identifier newtypes for processes and atomic cells.
//!
//! Both identifiers are dense indices assigned in creation order, which
//! keeps them reproducible across replays of the same schedule.

use std::fmt;

/// Index of a logical process in the registry, in spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(pub usize);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Identifier of an atomic cell within one run.
///
/// Ids are positive and dense, minted in allocation order starting from 1
/// by a run-local counter. Allocation order inside a deterministic test
/// program is itself deterministic, so the id is stable across replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtomicId(pub u64);

impl AtomicId {
    /// One-character label used in printed interleavings: id 1 is `'a'`,
    /// id 2 is `'b'`, and so on.
    pub fn label(self) -> char {
        char::from_u32(96 + self.0 as u32).unwrap_or('?')
    }
}

impl fmt::Display for AtomicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
