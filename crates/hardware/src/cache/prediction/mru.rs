//! Most Recently Used (MRU) Way Prediction.
//!
//! Keeps one way index per set and predicts the next hit lands on the way
//! that was touched last. Cheap and effective when a set is hammered by a
//! single hot line.

/// MRU prediction table.
#[derive(Debug, Clone)]
pub struct MruTable {
    /// Predicted way for each set.
    predicted: Vec<usize>,
}

impl MruTable {
    /// Creates a table predicting way 0 for every set.
    pub fn new(sets: usize) -> Self {
        Self {
            predicted: vec![0; sets],
        }
    }

    /// Current prediction for `set`.
    #[inline]
    pub fn predicted(&self, set: usize) -> usize {
        self.predicted[set]
    }

    /// Records a hit on `way`, returning whether it matched the prediction.
    ///
    /// The prediction moves to `way` either way.
    #[inline]
    pub fn record_hit(&mut self, set: usize, way: usize) -> bool {
        let first_hit = self.predicted[set] == way;
        self.predicted[set] = way;
        first_hit
    }

    /// Points the prediction at a freshly installed line.
    #[inline]
    pub fn record_fill(&mut self, set: usize, way: usize) {
        self.predicted[set] = way;
    }
}
