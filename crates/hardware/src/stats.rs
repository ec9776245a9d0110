//! Simulation statistics collection and reporting.
//!
//! This module tracks the outcome of a run. It provides:
//! 1. **Counters:** Reads, writes, hits, misses, victim-cache hits.
//! 2. **Way prediction:** First hits and multi-column search length.
//! 3. **Reporting:** `RunReport`, rendered as the classic `.info` text or serialized as JSON.
//!
//! Every rate guards its denominator; an empty run reports 0% rather than NaN.

use std::fmt;

use serde::Serialize;

use crate::cache::CacheSim;
use crate::config::{CacheConfig, WayPrediction};

/// Counters accumulated over one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Read accesses processed.
    pub reads: u64,
    /// Write accesses processed.
    pub writes: u64,
    /// Accesses served by the primary store or the victim cache.
    pub hits: u64,
    /// Accesses served by neither.
    pub misses: u64,
    /// Hits that landed on the predicted way.
    pub first_hits: u64,
    /// Cumulative multi-column bit-vector search length.
    pub search_length: u64,
    /// Hits served by promoting a block out of the victim cache.
    pub victim_hits: u64,
}

/// Percentage of `part` in `whole`, 0 when `whole` is 0.
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

impl RunStats {
    /// Accesses processed (`reads + writes`).
    pub const fn accesses(&self) -> u64 {
        self.reads + self.writes
    }

    /// Hits as a percentage of accesses.
    pub fn hit_rate(&self) -> f64 {
        percent(self.hits, self.accesses())
    }

    /// Misses as a percentage of accesses.
    pub fn miss_rate(&self) -> f64 {
        percent(self.misses, self.accesses())
    }

    /// Hits that did not land on the predicted way.
    pub const fn non_first_hits(&self) -> u64 {
        self.hits - self.first_hits
    }

    /// First hits as a percentage of hits.
    pub fn first_hit_rate(&self) -> f64 {
        percent(self.first_hits, self.hits)
    }

    /// Non-first hits as a percentage of hits.
    pub fn non_first_hit_rate(&self) -> f64 {
        percent(self.non_first_hits(), self.hits)
    }

    /// Mean multi-column search length per access.
    pub fn mean_search_length(&self) -> f64 {
        let accesses = self.accesses();
        if accesses == 0 {
            0.0
        } else {
            self.search_length as f64 / accesses as f64
        }
    }
}

/// Summary of a finished run: configuration, derived geometry and counters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunReport {
    /// Configuration that was simulated.
    pub config: CacheConfig,
    /// Total number of lines in the primary store.
    pub num_lines: usize,
    /// Tag field width in bits.
    pub tag_width: u32,
    /// Set-index field width in bits.
    pub index_width: u32,
    /// Block-offset field width in bits.
    pub offset_width: u32,
    /// Final counters.
    pub stats: RunStats,
}

impl RunReport {
    /// Captures the report of `cache` as configured by `config`.
    pub fn new(config: &CacheConfig, cache: &CacheSim) -> Self {
        let geometry = cache.geometry();
        let layout = geometry.layout();
        Self {
            config: config.clone(),
            num_lines: geometry.num_lines(),
            tag_width: layout.tag_width(),
            index_width: layout.index_width(),
            offset_width: layout.offset_width(),
            stats: *cache.stats(),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.config;
        let s = &self.stats;
        writeln!(f, "Block size: {} Bytes", c.block_bytes)?;
        writeln!(f, "Assoc: {}-way", c.assoc)?;
        writeln!(f, "Number of cacheline: {}", self.num_lines)?;
        writeln!(f, "Tag width: {}", self.tag_width)?;
        writeln!(f, "Index width: {}", self.index_width)?;
        writeln!(f, "Offset width: {}", self.offset_width)?;
        writeln!(f, "Write Hit Policy: {}", c.write_hit)?;
        writeln!(f, "Write Miss Policy: {}", c.write_miss)?;
        writeln!(f, "Replacement Algorithm: {}", c.replacement)?;
        writeln!(f, "Way Prediction Algorithm: {}", c.way_prediction)?;
        if c.victim_entries > 0 {
            writeln!(f, "Victim Cache: {} entries", c.victim_entries)?;
        }
        writeln!(f, "Memory access: {}", s.accesses())?;
        writeln!(f, "Hit: {}", s.hits)?;
        writeln!(f, "Hit Rate: {:.2}%", s.hit_rate())?;
        writeln!(f, "Miss: {}", s.misses)?;
        writeln!(f, "Miss Rate: {:.2}%", s.miss_rate())?;
        if c.victim_entries > 0 {
            writeln!(f, "Victim Cache Hit: {}", s.victim_hits)?;
        }
        if c.way_prediction.is_enabled() {
            writeln!(f, "Way Prediction First Hit: {}", s.first_hits)?;
            writeln!(f, "Way Prediction First Hit Rate: {:.2}%", s.first_hit_rate())?;
            writeln!(f, "Way Prediction Non-First Hit: {}", s.non_first_hits())?;
            writeln!(
                f,
                "Way Prediction Non-First Hit Rate: {:.2}%",
                s.non_first_hit_rate()
            )?;
        }
        if c.way_prediction == WayPrediction::MultiColumn {
            writeln!(
                f,
                "Way Prediction Mean Search Length: {:.4}",
                s.mean_search_length()
            )?;
        }
        Ok(())
    }
}
