//! Configuration system for the cache simulator.
//!
//! This module defines the structures and enums used to parameterize a run. It provides:
//! 1. **Defaults:** Baseline geometry and sweep constants.
//! 2. **Structures:** `CacheConfig` for one simulated cache and `SweepConfig` for a batch of them.
//! 3. **Enums:** Replacement, way-prediction, write-hit and write-miss selectors.
//! 4. **Validation:** `CacheConfig::geometry` rejects geometries whose index math would be wrong.
//!
//! Configuration is supplied as JSON (`CacheConfig::from_json`) or built in code from
//! `CacheConfig::default()`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::addr::AddressLayout;
use crate::common::error::ConfigError;

/// Default configuration constants for the simulator.
mod defaults {
    /// Total cache capacity (512 KiB).
    ///
    /// Every configuration in a sweep shares this capacity; only the way it is
    /// carved into sets and blocks changes.
    pub const CAPACITY: usize = 512 * 1024;

    /// Default block size in bytes.
    pub const BLOCK_BYTES: usize = 64;

    /// Default associativity (direct-mapped).
    pub const ASSOC: usize = 1;

    /// Block sizes visited by the default sweep.
    pub const SWEEP_BLOCK_SIZES: [usize; 3] = [8, 32, 64];

    /// Set-associative geometries visited by the default sweep, in addition
    /// to the fully-associative one.
    pub const SWEEP_ASSOCS: [usize; 3] = [1, 4, 8];

    /// Widest associativity a multi-column bit vector can describe.
    pub const MULTI_COLUMN_MAX_WAYS: usize = 64;
}

/// Cache replacement policy algorithms.
///
/// Specifies the algorithm used to select which line to evict when a new
/// line must be installed in a full set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least Recently Used replacement policy.
    ///
    /// Evicts the line that was accessed least recently.
    #[default]
    #[serde(alias = "Lru", alias = "lru")]
    Lru,
}

/// Way-prediction schemes.
///
/// A way predictor guesses which way of a set will hit before the full
/// associative search. Accuracy is reported as first-hit versus non-first-hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum WayPrediction {
    /// No way prediction.
    #[default]
    #[serde(alias = "none")]
    None,
    /// Predict the most recently used way of the set.
    #[serde(alias = "MRU", alias = "mru")]
    Mru,
    /// Predict the column selected by the low tag bits, relocating lines
    /// into their column on a miss or non-first hit.
    #[serde(alias = "multi_column", alias = "multicolumn")]
    MultiColumn,
}

/// Policy applied when a write hits a resident line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum WriteHitPolicy {
    /// Mark the line dirty; it is written to memory when evicted.
    #[default]
    #[serde(alias = "writeback", alias = "WriteBack")]
    Writeback,
    /// Propagate the write immediately; the line stays clean.
    #[serde(alias = "writethrough", alias = "WriteThrough")]
    Writethrough,
}

/// Policy applied when a write misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum WriteMissPolicy {
    /// Install the written block, exactly like a read miss.
    #[default]
    #[serde(alias = "write_allocate")]
    WriteAllocate,
    /// Bypass the cache; nothing is installed.
    #[serde(alias = "write_non_allocate", alias = "WriteNoAllocate")]
    WriteNonAllocate,
}

/// Configuration of one simulated cache.
///
/// # Examples
///
/// ```
/// use cachesim_core::config::{CacheConfig, WayPrediction};
///
/// let json = r#"{
///     "block_bytes": 32,
///     "assoc": 4,
///     "way_prediction": "Mru",
///     "victim_entries": 8,
///     "write_miss": "WriteNonAllocate"
/// }"#;
///
/// let config = CacheConfig::from_json(json).unwrap();
/// assert_eq!(config.capacity_bytes, 512 * 1024);
/// assert_eq!(config.way_prediction, WayPrediction::Mru);
/// assert_eq!(config.geometry().unwrap().num_sets(), 4096);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Total capacity in bytes
    #[serde(default = "CacheConfig::default_capacity")]
    pub capacity_bytes: usize,

    /// Block (line) size in bytes
    #[serde(default = "CacheConfig::default_block")]
    pub block_bytes: usize,

    /// Associativity (ways per set)
    #[serde(default = "CacheConfig::default_assoc")]
    pub assoc: usize,

    /// Replacement policy
    #[serde(default)]
    pub replacement: ReplacementPolicy,

    /// Way-prediction scheme
    #[serde(default)]
    pub way_prediction: WayPrediction,

    /// Victim cache entries; 0 disables the victim cache
    #[serde(default)]
    pub victim_entries: usize,

    /// Write-hit policy
    #[serde(default)]
    pub write_hit: WriteHitPolicy,

    /// Write-miss policy
    #[serde(default)]
    pub write_miss: WriteMissPolicy,
}

/// Validated dimensions of a cache.
///
/// Only obtainable through [`CacheConfig::geometry`], so holding one proves the
/// index and tag arithmetic is well formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    block_bytes: usize,
    assoc: usize,
    num_sets: usize,
    layout: AddressLayout,
}

impl CacheConfig {
    /// Returns the default capacity in bytes.
    fn default_capacity() -> usize {
        defaults::CAPACITY
    }

    /// Returns the default block size in bytes.
    fn default_block() -> usize {
        defaults::BLOCK_BYTES
    }

    /// Returns the default associativity.
    fn default_assoc() -> usize {
        defaults::ASSOC
    }

    /// Deserializes a configuration from a JSON document.
    ///
    /// Missing fields take their defaults. The result is not validated; call
    /// [`geometry`](Self::geometry) or build a simulator to do so.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document is malformed or names an
    /// unknown policy.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Associativity that turns the whole capacity into a single set.
    pub const fn fully_associative_ways(&self) -> usize {
        if self.block_bytes == 0 {
            0
        } else {
            self.capacity_bytes / self.block_bytes
        }
    }

    /// Validates the configuration and derives its geometry.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Zero`] / [`ConfigError::NotPowerOfTwo`] for bad size parameters.
    /// * [`ConfigError::TooFewSets`] if one set does not fit in the capacity.
    /// * [`ConfigError::MultiColumnTooWide`] for multi-column prediction over more than 64 ways.
    pub fn geometry(&self) -> Result<Geometry, ConfigError> {
        let capacity = power_of_two("capacity_bytes", self.capacity_bytes)?;
        let block = power_of_two("block_bytes", self.block_bytes)?;
        let assoc = power_of_two("assoc", self.assoc)?;

        let set_bytes = block.checked_mul(assoc).filter(|&bytes| bytes <= capacity);
        let Some(set_bytes) = set_bytes else {
            return Err(ConfigError::TooFewSets {
                capacity,
                block_bytes: block,
                assoc,
            });
        };

        match self.way_prediction {
            WayPrediction::MultiColumn if assoc > defaults::MULTI_COLUMN_MAX_WAYS => {
                return Err(ConfigError::MultiColumnTooWide { assoc });
            }
            WayPrediction::None | WayPrediction::Mru | WayPrediction::MultiColumn => {}
        }

        let num_sets = capacity / set_bytes;
        Ok(Geometry {
            block_bytes: block,
            assoc,
            num_sets,
            layout: AddressLayout::new(block.trailing_zeros(), num_sets.trailing_zeros()),
        })
    }

    /// Short identifier used to name per-configuration output files.
    ///
    /// Fields appear in sweep order: block size, replacement, write-hit,
    /// write-miss, associativity, way prediction, victim entries.
    pub fn label(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}_{}_{}",
            self.block_bytes,
            self.replacement.short_name(),
            self.write_hit.short_name(),
            self.write_miss.short_name(),
            self.assoc,
            self.way_prediction.short_name(),
            self.victim_entries
        )
    }
}

impl Default for CacheConfig {
    /// Creates a default configuration.
    ///
    /// 512 KiB, 64-byte blocks, direct-mapped, LRU, no way prediction,
    /// no victim cache, writeback and write-allocate.
    fn default() -> Self {
        Self {
            capacity_bytes: defaults::CAPACITY,
            block_bytes: defaults::BLOCK_BYTES,
            assoc: defaults::ASSOC,
            replacement: ReplacementPolicy::default(),
            way_prediction: WayPrediction::default(),
            victim_entries: 0,
            write_hit: WriteHitPolicy::default(),
            write_miss: WriteMissPolicy::default(),
        }
    }
}

fn power_of_two(field: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        Err(ConfigError::Zero { field })
    } else if !value.is_power_of_two() {
        Err(ConfigError::NotPowerOfTwo { field, value })
    } else {
        Ok(value)
    }
}

impl Geometry {
    /// Block size in bytes.
    #[inline(always)]
    pub const fn block_bytes(&self) -> usize {
        self.block_bytes
    }

    /// Ways per set.
    #[inline(always)]
    pub const fn assoc(&self) -> usize {
        self.assoc
    }

    /// Number of sets.
    #[inline(always)]
    pub const fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Total number of cache lines (`num_sets * assoc`).
    #[inline(always)]
    pub const fn num_lines(&self) -> usize {
        self.num_sets * self.assoc
    }

    /// Address layout for this geometry.
    #[inline(always)]
    pub const fn layout(&self) -> AddressLayout {
        self.layout
    }
}

/// A batch of configurations simulated against the same trace.
///
/// The batch is the cartesian product of every list below. The default
/// reproduces the classic study: three block sizes, fully-associative plus
/// 1/4/8-way, LRU, writeback, with and without write-allocate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Capacity shared by every configuration
    #[serde(default = "CacheConfig::default_capacity")]
    pub capacity_bytes: usize,

    /// Block sizes in bytes
    #[serde(default = "SweepConfig::default_block_sizes")]
    pub block_sizes: Vec<usize>,

    /// Include the fully-associative geometry for every block size
    #[serde(default = "SweepConfig::default_fully_associative")]
    pub fully_associative: bool,

    /// Set-associative associativities
    #[serde(default = "SweepConfig::default_associativities")]
    pub associativities: Vec<usize>,

    /// Replacement policies
    #[serde(default = "SweepConfig::default_replacement")]
    pub replacement: Vec<ReplacementPolicy>,

    /// Way-prediction schemes
    #[serde(default = "SweepConfig::default_way_prediction")]
    pub way_prediction: Vec<WayPrediction>,

    /// Victim cache sizes (0 disables)
    #[serde(default = "SweepConfig::default_victim_entries")]
    pub victim_entries: Vec<usize>,

    /// Write-hit policies
    #[serde(default = "SweepConfig::default_write_hit")]
    pub write_hit: Vec<WriteHitPolicy>,

    /// Write-miss policies
    #[serde(default = "SweepConfig::default_write_miss")]
    pub write_miss: Vec<WriteMissPolicy>,

    /// Worker threads; `None` uses one per available core
    #[serde(default)]
    pub threads: Option<usize>,
}

impl SweepConfig {
    fn default_block_sizes() -> Vec<usize> {
        defaults::SWEEP_BLOCK_SIZES.to_vec()
    }

    fn default_fully_associative() -> bool {
        true
    }

    fn default_associativities() -> Vec<usize> {
        defaults::SWEEP_ASSOCS.to_vec()
    }

    fn default_replacement() -> Vec<ReplacementPolicy> {
        vec![ReplacementPolicy::Lru]
    }

    fn default_way_prediction() -> Vec<WayPrediction> {
        vec![WayPrediction::None]
    }

    fn default_victim_entries() -> Vec<usize> {
        vec![0]
    }

    fn default_write_hit() -> Vec<WriteHitPolicy> {
        vec![WriteHitPolicy::Writeback]
    }

    fn default_write_miss() -> Vec<WriteMissPolicy> {
        vec![WriteMissPolicy::WriteAllocate, WriteMissPolicy::WriteNonAllocate]
    }

    /// Deserializes a sweep from a JSON document; absent lists take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: defaults::CAPACITY,
            block_sizes: Self::default_block_sizes(),
            fully_associative: Self::default_fully_associative(),
            associativities: Self::default_associativities(),
            replacement: Self::default_replacement(),
            way_prediction: Self::default_way_prediction(),
            victim_entries: Self::default_victim_entries(),
            write_hit: Self::default_write_hit(),
            write_miss: Self::default_write_miss(),
            threads: None,
        }
    }
}

impl ReplacementPolicy {
    /// Compact name used in output file names.
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Lru => "lru",
        }
    }
}

impl WayPrediction {
    /// Compact name used in output file names.
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mru => "mru",
            Self::MultiColumn => "mc",
        }
    }

    /// Whether first-hit statistics are meaningful.
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl WriteHitPolicy {
    /// Compact name used in output file names.
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Writeback => "wb",
            Self::Writethrough => "wt",
        }
    }
}

impl WriteMissPolicy {
    /// Compact name used in output file names.
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::WriteAllocate => "wa",
            Self::WriteNonAllocate => "wna",
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lru => f.write_str("LRU"),
        }
    }
}

impl fmt::Display for WayPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Mru => f.write_str("MRU"),
            Self::MultiColumn => f.write_str("Multi Column"),
        }
    }
}

impl fmt::Display for WriteHitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Writeback => f.write_str("Writeback"),
            Self::Writethrough => f.write_str("Writethrough"),
        }
    }
}

impl fmt::Display for WriteMissPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteAllocate => f.write_str("Write Allocate"),
            Self::WriteNonAllocate => f.write_str("Write Non-allocate"),
        }
    }
}

/// Lowercases and strips separators so `Write-Allocate`, `write_allocate`
/// and `writeallocate` all compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl FromStr for ReplacementPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "lru" => Ok(Self::Lru),
            _ => Err(ConfigError::UnknownSelector {
                kind: "replacement policy",
                value: s.to_owned(),
            }),
        }
    }
}

impl FromStr for WayPrediction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "none" => Ok(Self::None),
            "mru" => Ok(Self::Mru),
            "multicolumn" | "mc" => Ok(Self::MultiColumn),
            _ => Err(ConfigError::UnknownSelector {
                kind: "way prediction",
                value: s.to_owned(),
            }),
        }
    }
}

impl FromStr for WriteHitPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "writeback" | "wb" => Ok(Self::Writeback),
            "writethrough" | "wt" => Ok(Self::Writethrough),
            _ => Err(ConfigError::UnknownSelector {
                kind: "write-hit policy",
                value: s.to_owned(),
            }),
        }
    }
}

impl FromStr for WriteMissPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "writeallocate" | "wa" => Ok(Self::WriteAllocate),
            "writenonallocate" | "writenoallocate" | "wna" => Ok(Self::WriteNonAllocate),
            _ => Err(ConfigError::UnknownSelector {
                kind: "write-miss policy",
                value: s.to_owned(),
            }),
        }
    }
}
