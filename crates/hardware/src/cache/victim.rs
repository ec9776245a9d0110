//! Victim Cache.
//!
//! A small fully-associative buffer that catches lines evicted from the
//! primary store. A primary miss that finds its block here is promoted back
//! instead of going to memory, which absorbs conflict misses between a few
//! hot blocks that share a set.
//!
//! Entries have no implicit set index, so they are tagged with the full block
//! address (`addr >> log2(block size)`). Slots are managed by their own LRU
//! stack, treated as a single set.

use super::CacheLine;
use super::policies::{LruPolicy, ReplacementPolicy};

/// Fully-associative victim buffer.
#[derive(Debug, Clone)]
pub struct VictimCache {
    entries: Vec<CacheLine>,
    lru: LruPolicy,
}

impl VictimCache {
    /// Creates an empty victim cache with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![CacheLine::default(); capacity],
            lru: LruPolicy::new(1, capacity),
        }
    }

    /// Number of slots.
    pub const fn capacity(&self) -> usize {
        self.lru.ways()
    }

    /// All slots, valid or not.
    pub fn entries(&self) -> &[CacheLine] {
        &self.entries
    }

    /// Slot recency order, most recently used first.
    pub fn order(&self) -> &[usize] {
        self.lru.order(0)
    }

    /// Finds the slot holding `block`, if any. Does not update recency.
    pub fn probe(&self, block: u64) -> Option<usize> {
        self.entries
            .iter()
            .position(|line| line.valid && line.tag == block)
    }

    /// Removes the line in `slot`, leaving the slot invalid.
    pub fn take(&mut self, slot: usize) -> CacheLine {
        std::mem::take(&mut self.entries[slot])
    }

    /// Places `line` in `slot` and marks the slot most recently used.
    ///
    /// `line.tag` must already be a full block address.
    pub fn store(&mut self, slot: usize, line: CacheLine) {
        debug_assert!(self.probe(line.tag).is_none_or(|s| s == slot));
        self.entries[slot] = line;
        self.lru.update(0, slot);
    }

    /// Inserts `line` into the least recently used slot.
    ///
    /// Returns the line that slot held if it was valid. That line leaves the
    /// hierarchy for good.
    pub fn insert(&mut self, line: CacheLine) -> Option<CacheLine> {
        let slot = self.lru.get_victim(0);
        let displaced = std::mem::replace(&mut self.entries[slot], line);
        self.lru.update(0, slot);
        displaced.valid.then_some(displaced)
    }
}
