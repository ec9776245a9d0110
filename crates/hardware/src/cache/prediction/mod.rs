//! Way Prediction.
//!
//! A way predictor guesses which way of a set an access will hit before the
//! full associative search completes. The simulator does not model timing; it
//! only scores each hit as a *first hit* (the prediction was right) or a
//! *non-first hit*.
//!
//! # Schemes
//!
//! - `None`: no prediction and no extra state.
//! - `Mru`: predict the way that was used last in the set.
//! - `MultiColumn`: predict the *major location* `tag & (ways - 1)` and keep
//!   lines there by physically relocating them on fills and non-first hits.
//!
//! Predictors never touch the line array themselves. Each hook returns a
//! verdict and the cache applies any requested relocation to both the lines
//! and the replacement policy, so the two stay in lockstep.

/// Most-recently-used way predictor.
pub mod mru;

/// Multi-column way predictor.
pub mod multi_column;

pub use mru::MruTable;
pub use multi_column::MultiColumnTable;

use crate::config::WayPrediction;

/// Outcome of consulting the predictor on an access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verdict {
    /// The access hit the predicted way.
    pub first_hit: bool,
    /// Bit-vector entries examined to locate (or rule out) the line.
    pub search_length: u64,
    /// Way the line that was just hit or filled must be moved to.
    pub relocate_to: Option<usize>,
}

/// Per-set way-prediction state, selected once at construction.
#[derive(Debug, Clone)]
pub enum WayPredictor {
    /// Prediction disabled.
    None,
    /// One predicted way per set.
    Mru(MruTable),
    /// One bit vector per column per set.
    MultiColumn(MultiColumnTable),
}

impl WayPredictor {
    /// Builds empty predictor state for `sets` sets of `ways` ways.
    pub fn new(kind: WayPrediction, sets: usize, ways: usize) -> Self {
        match kind {
            WayPrediction::None => Self::None,
            WayPrediction::Mru => Self::Mru(MruTable::new(sets)),
            WayPrediction::MultiColumn => Self::MultiColumn(MultiColumnTable::new(sets, ways)),
        }
    }

    /// Scores a hit on `way` and updates the prediction.
    ///
    /// # Arguments
    ///
    /// * `set` - Set that was accessed.
    /// * `way` - Way the line was found in.
    /// * `major` - Major location of the accessed tag.
    pub fn on_hit(&mut self, set: usize, way: usize, major: usize) -> Verdict {
        match self {
            Self::None => Verdict::default(),
            Self::Mru(table) => Verdict {
                first_hit: table.record_hit(set, way),
                ..Verdict::default()
            },
            Self::MultiColumn(table) => {
                if way == major {
                    Verdict {
                        first_hit: true,
                        ..Verdict::default()
                    }
                } else {
                    Verdict {
                        first_hit: false,
                        search_length: table.hit_search_length(set, major, way),
                        relocate_to: Some(major),
                    }
                }
            }
        }
    }

    /// Updates the prediction after a line was installed in `way`.
    ///
    /// For multi-column prediction the returned search length is the cost of
    /// scanning the whole column before declaring the miss.
    pub fn on_fill(&mut self, set: usize, way: usize, major: usize) -> Verdict {
        match self {
            Self::None => Verdict::default(),
            Self::Mru(table) => {
                table.record_fill(set, way);
                Verdict::default()
            }
            Self::MultiColumn(table) => {
                let search_length = table.miss_search_length(set, major);
                table.claim(set, major, way);
                Verdict {
                    first_hit: false,
                    search_length,
                    relocate_to: (way != major).then_some(major),
                }
            }
        }
    }

    /// Which scheme this predictor implements.
    pub const fn kind(&self) -> WayPrediction {
        match self {
            Self::None => WayPrediction::None,
            Self::Mru(_) => WayPrediction::Mru,
            Self::MultiColumn(_) => WayPrediction::MultiColumn,
        }
    }
}
