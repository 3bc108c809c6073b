//! Addresses of values stored in a [`ChunkIndex`](super::ChunkIndex)

use std::fmt;

use serde::{Deserialize, Serialize};

use super::coord::ChunkCoord;

/// Position of a value inside one chunk: leaf index and slot within the leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeafSlot {
    pub leaf: usize,
    pub slot: usize,
}

impl LeafSlot {
    pub fn new(leaf: usize, slot: usize) -> Self {
        Self { leaf, slot }
    }
}

/// Full address of a stored value: chunk, leaf and slot.
///
/// Locators are only valid while the slot they name is live. Removing values
/// from a leaf shifts later slots, so callers holding locators into a leaf
/// must not remove from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locator {
    pub chunk: ChunkCoord,
    pub leaf: usize,
    pub slot: usize,
}

impl Locator {
    pub fn new(chunk: ChunkCoord, leaf: usize, slot: usize) -> Self {
        Self { chunk, leaf, slot }
    }

    pub fn leaf_slot(&self) -> LeafSlot {
        LeafSlot::new(self.leaf, self.slot)
    }

    /// Locator in the same leaf pointing at another slot
    pub fn with_slot(&self, slot: usize) -> Self {
        Self { slot, ..*self }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}:{}", self.chunk, self.leaf, self.slot)
    }
}
