//! Set-Associative Cache Simulator.
//!
//! This module implements the cache engine. It models hits and misses of a
//! set-associative cache against a stream of reads and writes, tracking only
//! metadata (valid, dirty, tag); no data is stored. It combines:
//! 1. **Store:** A flat array of `sets * ways` lines, set `s` owning `[s * ways, (s + 1) * ways)`.
//! 2. **Replacement:** A [`ReplacementPolicy`] choosing victims and reordering on hits.
//! 3. **Way Prediction:** An optional [`WayPredictor`] that may relocate lines inside a set.
//! 4. **Victim Cache:** An optional [`VictimCache`] consulted before declaring a miss.
//! 5. **Write Policies:** Writeback/writethrough on hits, allocate/non-allocate on misses.

/// Cache replacement policy implementations.
pub mod policies;

/// Way-prediction schemes.
pub mod prediction;

/// Fully-associative victim buffer.
pub mod victim;

use serde::Serialize;
use tracing::debug;

use self::policies::{LruPolicy, ReplacementPolicy};
use self::prediction::WayPredictor;
use self::victim::VictimCache;
use crate::common::addr::{AddressLayout, DecodedAddr};
use crate::common::error::{ConfigError, InvariantViolation};
use crate::config::{
    CacheConfig, Geometry, ReplacementPolicy as PolicyType, WriteHitPolicy, WriteMissPolicy,
};
use crate::stats::RunStats;

/// Cache line entry containing tag, validity, and dirty bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheLine {
    /// Primary-store tag, or full block address inside the victim cache.
    pub tag: u64,
    /// The line holds a block.
    pub valid: bool,
    /// The block was written under writeback and not yet written back.
    pub dirty: bool,
}

/// Result of one access as seen from outside the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Served by the primary store or the victim cache.
    Hit,
    /// Not resident anywhere.
    Miss,
}

/// Cache simulator implementing a set-associative cache with configurable policies.
///
/// Owns every piece of state for one configuration; two simulators never share
/// anything, so independent configurations can run on separate threads.
#[derive(Debug)]
pub struct CacheSim {
    geometry: Geometry,
    layout: AddressLayout,
    lines: Vec<CacheLine>,
    policy: Box<dyn ReplacementPolicy + Send + Sync>,
    predictor: WayPredictor,
    victim: Option<VictimCache>,
    write_hit: WriteHitPolicy,
    write_miss: WriteMissPolicy,
    stats: RunStats,
}

impl CacheSim {
    /// Creates a new cache simulator with the specified configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Geometry, replacement, way-prediction, victim and write policies.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the geometry is invalid or the policy
    /// combination is unsupported. No state is built in that case.
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        let geometry = config.geometry()?;
        let sets = geometry.num_sets();
        let ways = geometry.assoc();

        let policy: Box<dyn ReplacementPolicy + Send + Sync> = match config.replacement {
            PolicyType::Lru => Box::new(LruPolicy::new(sets, ways)),
        };

        let victim = (config.victim_entries > 0).then(|| VictimCache::new(config.victim_entries));

        debug!(
            block_bytes = geometry.block_bytes(),
            assoc = ways,
            sets,
            tag_width = geometry.layout().tag_width(),
            way_prediction = %config.way_prediction,
            victim_entries = config.victim_entries,
            "cache constructed"
        );

        Ok(Self {
            layout: geometry.layout(),
            lines: vec![CacheLine::default(); geometry.num_lines()],
            policy,
            predictor: WayPredictor::new(config.way_prediction, sets, ways),
            victim,
            write_hit: config.write_hit,
            write_miss: config.write_miss,
            stats: RunStats::default(),
            geometry,
        })
    }

    /// Validated geometry of this cache.
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Counters accumulated so far.
    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Mutable counters, for the access driver's read/write tallies.
    pub(crate) fn stats_mut(&mut self) -> &mut RunStats {
        &mut self.stats
    }

    /// Lines of `set`, indexed by way.
    pub fn set_lines(&self, set: usize) -> &[CacheLine] {
        let ways = self.geometry.assoc();
        &self.lines[set * ways..(set + 1) * ways]
    }

    /// Replacement recency order of `set`, most recently used first.
    pub fn recency(&self, set: usize) -> &[usize] {
        self.policy.order(set)
    }

    /// Way-prediction state.
    pub const fn predictor(&self) -> &WayPredictor {
        &self.predictor
    }

    /// Victim cache, if enabled.
    pub const fn victim_cache(&self) -> Option<&VictimCache> {
        self.victim.as_ref()
    }

    /// Decodes `addr` with this cache's layout.
    pub const fn decode(&self, addr: u64) -> DecodedAddr {
        self.layout.decode(addr)
    }

    /// Checks if the primary store holds the block containing `addr`.
    pub fn contains(&self, addr: u64) -> bool {
        let d = self.layout.decode(addr);
        self.find(d.set, d.tag).is_some()
    }

    /// Checks if the victim cache holds the block containing `addr`.
    pub fn victim_contains(&self, addr: u64) -> bool {
        let block = self.layout.block_address(addr);
        self.victim
            .as_ref()
            .is_some_and(|v| v.probe(block).is_some())
    }

    /// Primary-store line holding `addr`, if resident.
    pub fn line(&self, addr: u64) -> Option<&CacheLine> {
        let d = self.layout.decode(addr);
        self.find(d.set, d.tag)
            .map(|way| &self.lines[self.index(d.set, way)])
    }

    #[inline(always)]
    const fn index(&self, set: usize, way: usize) -> usize {
        set * self.geometry.assoc() + way
    }

    #[inline]
    fn find(&self, set: usize, tag: u64) -> Option<usize> {
        self.set_lines(set)
            .iter()
            .position(|line| line.valid && line.tag == tag)
    }

    /// Performs a read of `addr`.
    ///
    /// Lookup order is primary store, then victim cache. A primary hit updates
    /// replacement and way-prediction state; a victim hit promotes the block
    /// into the primary store; anything else is a miss that installs the block.
    pub fn read(&mut self, addr: u64) -> Outcome {
        let d = self.layout.decode(addr);

        if let Some(way) = self.find(d.set, d.tag) {
            self.hit(d, way);
            return Outcome::Hit;
        }

        let block = self.layout.block_address(addr);
        if let Some(slot) = self.victim.as_ref().and_then(|v| v.probe(block)) {
            self.promote(d, slot);
            return Outcome::Hit;
        }

        self.stats.misses += 1;
        let evicted = self.fill(d);
        if let (Some(victim), Some(line)) = (self.victim.as_mut(), evicted) {
            let demoted = CacheLine {
                tag: self.layout.rebuild_block(line.tag, d.set),
                ..line
            };
            if let Some(dropped) = victim.insert(demoted) {
                tracing::trace!(block = dropped.tag, dirty = dropped.dirty, "victim cache drop");
            }
        }
        Outcome::Miss
    }

    /// Performs a write of `addr`.
    ///
    /// Hits (primary or victim) reuse the read path for their bookkeeping and
    /// then apply the write-hit policy. Misses follow the write-miss policy:
    /// write-allocate reuses the read path to install the block, write-non-allocate
    /// only counts the miss. The read path is an internal step here; callers
    /// still see exactly one outcome for the write.
    pub fn write(&mut self, addr: u64) -> Outcome {
        let d = self.layout.decode(addr);
        let in_primary = self.find(d.set, d.tag).is_some();
        let in_victim = self.victim_contains(addr);
        debug_assert!(
            !(in_primary && in_victim),
            "block {addr:#x} resident in both primary store and victim cache"
        );

        if in_primary || in_victim {
            let outcome = self.read(addr);
            debug_assert_eq!(outcome, Outcome::Hit);
            self.apply_write_hit(d);
            return Outcome::Hit;
        }

        match self.write_miss {
            WriteMissPolicy::WriteNonAllocate => {
                self.stats.misses += 1;
                Outcome::Miss
            }
            WriteMissPolicy::WriteAllocate => {
                let outcome = self.read(addr);
                self.apply_write_hit(d);
                outcome
            }
        }
    }

    /// Marks the now-resident line dirty under writeback.
    fn apply_write_hit(&mut self, d: DecodedAddr) {
        match self.write_hit {
            WriteHitPolicy::Writethrough => {}
            WriteHitPolicy::Writeback => {
                if let Some(way) = self.find(d.set, d.tag) {
                    let idx = self.index(d.set, way);
                    self.lines[idx].dirty = true;
                }
            }
        }
    }

    fn hit(&mut self, d: DecodedAddr, way: usize) {
        self.stats.hits += 1;
        self.policy.update(d.set, way);

        let major = d.major_location(self.geometry.assoc());
        let verdict = self.predictor.on_hit(d.set, way, major);
        if verdict.first_hit {
            self.stats.first_hits += 1;
        }
        self.stats.search_length += verdict.search_length;
        if let Some(target) = verdict.relocate_to {
            self.swap_ways(d.set, way, target);
        }
    }

    /// Moves the block in victim `slot` back into the primary store, demoting
    /// the primary victim into the freed slot.
    ///
    /// Way prediction is left alone: the block is installed wherever
    /// replacement puts it and is not relocated to its major location.
    fn promote(&mut self, d: DecodedAddr, slot: usize) {
        self.stats.hits += 1;
        self.stats.victim_hits += 1;

        if let Some(victim) = self.victim.as_mut() {
            let _promoted = victim.take(slot);
        }
        let (_, evicted) = self.install(d);
        if let (Some(victim), Some(line)) = (self.victim.as_mut(), evicted) {
            victim.store(
                slot,
                CacheLine {
                    tag: self.layout.rebuild_block(line.tag, d.set),
                    ..line
                },
            );
        }
    }

    /// Installs the block of `d` on a true miss and updates way prediction.
    ///
    /// Returns the valid line that was evicted, still carrying its primary tag.
    fn fill(&mut self, d: DecodedAddr) -> Option<CacheLine> {
        let (way, evicted) = self.install(d);

        let major = d.major_location(self.geometry.assoc());
        let verdict = self.predictor.on_fill(d.set, way, major);
        self.stats.search_length += verdict.search_length;
        if let Some(target) = verdict.relocate_to {
            self.swap_ways(d.set, way, target);
        }
        evicted
    }

    /// Places the block of `d` clean in the replacement victim way and marks
    /// that way most recently used.
    ///
    /// Returns the way used and the valid line it held, if any.
    fn install(&mut self, d: DecodedAddr) -> (usize, Option<CacheLine>) {
        let way = self.policy.get_victim(d.set);
        self.policy.update(d.set, way);

        let idx = self.index(d.set, way);
        let evicted = std::mem::replace(
            &mut self.lines[idx],
            CacheLine {
                tag: d.tag,
                valid: true,
                dirty: false,
            },
        );
        (way, evicted.valid.then_some(evicted))
    }

    /// Physically swaps two ways of `set` and mirrors the swap in the replacement state.
    fn swap_ways(&mut self, set: usize, a: usize, b: usize) {
        let base = self.index(set, 0);
        self.lines.swap(base + a, base + b);
        self.policy.swap_ways(set, a, b);
    }

    /// Verifies the structural invariants of every set.
    ///
    /// Checks that each recency order is a permutation of the ways, that no set
    /// or victim cache holds a tag twice, and that multi-column vectors claim
    /// each way at most once. Intended for tests and debug builds; a violation
    /// is a simulator bug, never a property of the input.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let ways = self.geometry.assoc();
        let mut seen = vec![false; ways];
        for set in 0..self.geometry.num_sets() {
            seen.fill(false);
            for &way in self.policy.order(set) {
                if way >= ways || std::mem::replace(&mut seen[way], true) {
                    return Err(InvariantViolation::RecencyOrder { set });
                }
            }

            let lines = self.set_lines(set);
            for (i, a) in lines.iter().enumerate().filter(|(_, l)| l.valid) {
                if lines[i + 1..].iter().any(|b| b.valid && b.tag == a.tag) {
                    return Err(InvariantViolation::DuplicateTag { set, tag: a.tag });
                }
            }

            if let WayPredictor::MultiColumn(table) = &self.predictor {
                let mut claimed = 0u64;
                for column in table.columns(set) {
                    if claimed & column != 0 {
                        return Err(InvariantViolation::ColumnOverlap { set });
                    }
                    claimed |= column;
                }
            }
        }

        if let Some(victim) = &self.victim {
            let entries = victim.entries();
            for (i, a) in entries.iter().enumerate().filter(|(_, l)| l.valid) {
                if entries[i + 1..].iter().any(|b| b.valid && b.tag == a.tag) {
                    return Err(InvariantViolation::DuplicateVictim { block: a.tag });
                }
                let (tag, set) = self.layout.split_block(a.tag);
                if self.find(set, tag).is_some() {
                    return Err(InvariantViolation::ResidentTwice { block: a.tag });
                }
            }
        }
        Ok(())
    }
}
