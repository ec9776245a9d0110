//! Least Recently Used (LRU) Replacement Policy.
//!
//! This policy evicts the cache line that has not been accessed for the longest time.
//! It maintains a usage stack for each set. When a line is accessed, it is moved
//! to the top (Most Recently Used position). The bottom of the stack represents
//! the Least Recently Used line.
//!
//! All stacks live in one contiguous table of `sets * ways` entries; set `s`
//! owns the slice `[s * ways, (s + 1) * ways)`.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `update()`: O(W) where W is the number of ways (associativity)
//!   - `get_victim()`: O(1)
//!   - `swap_ways()`: O(W)
//! - **Space Complexity:** O(S × W) where S is the number of sets
//! - **Best Case:** Workloads with good temporal locality
//! - **Worst Case:** Scanning patterns larger than the cache (thrashing)

use super::ReplacementPolicy;

/// LRU Policy state.
#[derive(Debug, Clone)]
pub struct LruPolicy {
    /// Usage stacks, one `ways`-long slice per set.
    /// Within a slice index 0 is MRU, the last index is LRU.
    usage: Vec<usize>,
    ways: usize,
}

impl LruPolicy {
    /// Creates a new LRU policy instance.
    ///
    /// Every stack starts as `[ways-1, ..., 1, 0]`, so an empty set fills
    /// way 0 first, then way 1, and so on.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        let mut usage = Vec::with_capacity(sets * ways);
        for _ in 0..sets {
            usage.extend((0..ways).rev());
        }
        Self { usage, ways }
    }

    /// Number of ways tracked per set.
    pub const fn ways(&self) -> usize {
        self.ways
    }

    #[inline(always)]
    fn stack(&self, set: usize) -> &[usize] {
        &self.usage[set * self.ways..(set + 1) * self.ways]
    }

    #[inline(always)]
    fn stack_mut(&mut self, set: usize) -> &mut [usize] {
        &mut self.usage[set * self.ways..(set + 1) * self.ways]
    }
}

impl ReplacementPolicy for LruPolicy {
    /// Moves `way` to the MRU position, shifting the more recent entries down
    /// by one. Entries older than `way` keep their positions.
    fn update(&mut self, set: usize, way: usize) {
        let stack = self.stack_mut(set);
        if let Some(pos) = stack.iter().position(|&w| w == way) {
            stack[..=pos].rotate_right(1);
        } else {
            debug_assert!(false, "way {way} missing from LRU stack of set {set}");
        }
    }

    /// Returns the way at the bottom of the usage stack (LRU position).
    fn get_victim(&self, set: usize) -> usize {
        self.stack(set)[self.ways - 1]
    }

    fn swap_ways(&mut self, set: usize, a: usize, b: usize) {
        debug_assert!(a < self.ways && b < self.ways && a != b);
        for entry in self.stack_mut(set) {
            if *entry == a {
                *entry = b;
            } else if *entry == b {
                *entry = a;
            }
        }
    }

    fn order(&self, set: usize) -> &[usize] {
        self.stack(set)
    }
}
