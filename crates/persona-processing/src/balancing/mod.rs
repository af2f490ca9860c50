//! Class balancing for the training split.
//!
//! Only SMOTE is provided. Test data must never pass through here.

mod smote;

pub use smote::Smote;

use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Result of resampling.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleResult {
    /// Original rows followed by synthetic rows.
    pub x: Array2<f64>,
    pub y: Array1<i64>,
    /// Synthetic rows generated per class.
    pub n_synthetic: BTreeMap<i64, usize>,
}

impl ResampleResult {
    pub fn total_synthetic(&self) -> usize {
        self.n_synthetic.values().sum()
    }
}

/// Class distribution, ordered by class code.
pub fn class_counts(y: &Array1<i64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Row indices per class, ordered by class code.
pub fn class_indices(y: &Array1<i64>) -> BTreeMap<i64, Vec<usize>> {
    let mut indices = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}
