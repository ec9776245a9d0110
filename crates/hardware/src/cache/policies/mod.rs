//! Cache Replacement Policies.
//!
//! Implements the algorithms that pick which way of a set to evict.
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used.
//!
//! Besides victim selection, a policy must follow lines that way prediction
//! physically relocates inside a set, so the trait exposes `swap_ways`.

/// Least Recently Used replacement policy.
pub mod lru;

pub use lru::LruPolicy;

/// Trait for cache replacement policies.
///
/// Defines the interface for updating usage state and selecting victim lines.
/// Policy state is a per-set table indexed by set number; sets never share state.
pub trait ReplacementPolicy: Send + Sync + std::fmt::Debug {
    /// Updates the policy state when a way is accessed or filled.
    ///
    /// # Arguments
    ///
    /// * `set` - The cache set index.
    /// * `way` - The way index within the set that was accessed.
    fn update(&mut self, set: usize, way: usize);

    /// Selects the way to evict from `set`. Does not change any state.
    ///
    /// # Arguments
    ///
    /// * `set` - The cache set index.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn get_victim(&self, set: usize) -> usize;

    /// Exchanges the bookkeeping of ways `a` and `b` after the lines in those
    /// ways were physically swapped.
    ///
    /// # Arguments
    ///
    /// * `set` - The cache set index.
    /// * `a`, `b` - Distinct way indices within the set.
    fn swap_ways(&mut self, set: usize, a: usize, b: usize);

    /// Recency order of `set`, most recently used first.
    fn order(&self, set: usize) -> &[usize];
}
