//! Multi-Column Way Prediction.
//!
//! Every tag has a *major location*, the way selected by its low bits. The
//! predictor always guesses the major location first, and the cache moves
//! lines into their major location whenever it can so that guess keeps
//! paying off.
//!
//! Each set keeps one bit vector per column. Bit `k` in column `c` records
//! that way `k` was filled on behalf of column `c`; on a mispredict the
//! hardware walks that vector to find the line, so the number of set bits
//! walked is reported as the search length.
//!
//! # Invariant
//!
//! A way index is set in at most one column of its set. [`claim`](MultiColumnTable::claim)
//! clears the way from every column before setting it in the new one.

/// Multi-column bit-vector table.
#[derive(Debug, Clone)]
pub struct MultiColumnTable {
    /// `ways` vectors per set, laid out set-major.
    columns: Vec<u64>,
    ways: usize,
}

impl MultiColumnTable {
    /// Creates empty vectors for `sets` sets of `ways` columns.
    ///
    /// `ways` must not exceed 64; configuration validation enforces this.
    pub fn new(sets: usize, ways: usize) -> Self {
        debug_assert!(ways <= u64::BITS as usize);
        Self {
            columns: vec![0; sets * ways],
            ways,
        }
    }

    /// Bit vectors of every column of `set`, indexed by column.
    #[inline]
    pub fn columns(&self, set: usize) -> &[u64] {
        &self.columns[set * self.ways..(set + 1) * self.ways]
    }

    #[inline(always)]
    fn column(&self, set: usize, major: usize) -> u64 {
        self.columns[set * self.ways + major]
    }

    /// Search cost of a non-first hit found in `way`.
    ///
    /// Counts the set bits of column `major` up to and including `way`,
    /// skipping `major` itself since the first probe already covered it.
    pub fn hit_search_length(&self, set: usize, major: usize, way: usize) -> u64 {
        let below = if way + 1 >= u64::BITS as usize {
            u64::MAX
        } else {
            (1u64 << (way + 1)) - 1
        };
        u64::from((self.column(set, major) & below & !(1u64 << major)).count_ones())
    }

    /// Search cost of confirming a miss: every set bit of column `major`
    /// except `major` itself.
    pub fn miss_search_length(&self, set: usize, major: usize) -> u64 {
        u64::from((self.column(set, major) & !(1u64 << major)).count_ones())
    }

    /// Moves ownership of `way` to column `major`.
    pub fn claim(&mut self, set: usize, major: usize, way: usize) {
        let bit = 1u64 << way;
        let base = set * self.ways;
        for column in &mut self.columns[base..base + self.ways] {
            *column &= !bit;
        }
        self.columns[base + major] |= bit;
    }
}
