//! SMOTE (Synthetic Minority Over-sampling Technique).
//!
//! Every minority class is grown to the size of the largest class. A
//! synthetic row is `p + gap * (n - p)` where `p` is a random row of the
//! class, `n` one of its `k` nearest same-class neighbours and
//! `gap ~ U[0, 1)`.

use super::{ResampleResult, class_counts, class_indices};
use crate::error::{PreprocessingError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use tracing::{debug, warn};

/// Distance/index pair ordered by distance, then index, for a max-heap.
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0).then(self.1.cmp(&other.1))
    }
}

/// Seeded SMOTE oversampler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Default for Smote {
    fn default() -> Self {
        Self::new()
    }
}

impl Smote {
    /// Five neighbours, seed 42.
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
    }

    /// `k` nearest rows of `members` to `members[pos]`, nearest first.
    ///
    /// Indices are positions within `members`.
    fn neighbours(x: &Array2<f64>, members: &[usize], pos: usize, k: usize) -> Vec<usize> {
        let point = x.row(members[pos]);
        let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);

        for (other, &row) in members.iter().enumerate() {
            if other == pos {
                continue;
            }
            let candidate = DistIdx(Self::squared_distance(point, x.row(row)), other);
            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(worst) = heap.peek()
                && candidate < *worst
            {
                heap.pop();
                heap.push(candidate);
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|DistIdx(_, i)| i)
            .collect()
    }

    /// Oversample every minority class up to the majority count.
    ///
    /// Output keeps the input rows first, in order, then the synthetic rows
    /// grouped by class code. The same input and seed always give the same
    /// output.
    pub fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        if x.nrows() != y.len() {
            return Err(PreprocessingError::FeatureMismatch {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let counts = class_counts(y);
        if counts.len() < 2 {
            return Err(PreprocessingError::Resampling(format!(
                "need at least 2 classes, found {}",
                counts.len()
            )));
        }
        let target = counts.values().copied().max().unwrap_or(0);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let n_features = x.ncols();
        let mut synthetic: Vec<f64> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();
        let mut n_synthetic = BTreeMap::new();

        for (class, members) in class_indices(y) {
            let n_to_generate = target - members.len();
            n_synthetic.insert(class, n_to_generate);
            if n_to_generate == 0 {
                continue;
            }

            let k = self.k_neighbors.min(members.len() - 1);
            if k == 0 {
                warn!(
                    "Class {} has a single sample; synthetic rows will duplicate it",
                    class
                );
            }
            let neighbour_table: Vec<Vec<usize>> = (0..members.len())
                .map(|pos| Self::neighbours(x, &members, pos, k))
                .collect();

            for _ in 0..n_to_generate {
                let pos = rng.gen_range(0..members.len());
                let point = x.row(members[pos]);
                let neighbours = &neighbour_table[pos];

                if neighbours.is_empty() {
                    synthetic.extend(point.iter().copied());
                } else {
                    let neighbour = x.row(members[neighbours[rng.gen_range(0..neighbours.len())]]);
                    let gap: f64 = rng.r#gen();
                    synthetic.extend(
                        point
                            .iter()
                            .zip(neighbour.iter())
                            .map(|(&p, &n)| p + gap * (n - p)),
                    );
                }
                synthetic_y.push(class);
            }

            debug!(
                "Class {}: {} -> {} rows (k={})",
                class,
                members.len(),
                target,
                k
            );
        }

        let n_new = synthetic_y.len();
        let synthetic = Array2::from_shape_vec((n_new, n_features), synthetic)
            .map_err(|e| PreprocessingError::Internal(format!("synthetic block shape: {}", e)))?;
        let x_out = ndarray::concatenate(ndarray::Axis(0), &[x.view(), synthetic.view()])
            .map_err(|e| PreprocessingError::Internal(format!("stacking synthetic rows: {}", e)))?;

        let mut y_out: Vec<i64> = y.to_vec();
        y_out.extend(synthetic_y);

        Ok(ResampleResult {
            x: x_out,
            y: Array1::from(y_out),
            n_synthetic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    fn imbalanced() -> (Array2<f64>, Array1<i64>) {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.2],
            [0.2, 0.1],
            [0.3, 0.3],
            [0.4, 0.2],
            [0.5, 0.4],
            [5.0, 5.0],
            [5.5, 5.2],
            [5.2, 5.6],
        ];
        let y = array![0, 0, 0, 0, 0, 0, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn test_balances_to_majority() {
        let (x, y) = imbalanced();
        let result = Smote::new().fit_resample(&x, &y).unwrap();

        assert_eq!(class_counts(&result.y), BTreeMap::from([(0, 6), (1, 6)]));
        assert_eq!(result.x.nrows(), 12);
        assert_eq!(result.total_synthetic(), 3);
        assert_eq!(result.n_synthetic[&0], 0);
    }

    #[test]
    fn test_original_rows_kept_in_front() {
        let (x, y) = imbalanced();
        let result = Smote::new().fit_resample(&x, &y).unwrap();
        assert_eq!(result.x.slice(ndarray::s![..9, ..]), x);
        assert_eq!(result.y.slice(ndarray::s![..9]), y);
    }

    #[test]
    fn test_synthetic_rows_lie_within_class_hull() {
        let (x, y) = imbalanced();
        let result = Smote::new().fit_resample(&x, &y).unwrap();
        for row in result.x.rows().into_iter().skip(9) {
            assert!((5.0..=5.5).contains(&row[0]));
            assert!((5.0..=5.6).contains(&row[1]));
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (x, y) = imbalanced();
        let a = Smote::new().with_seed(7).fit_resample(&x, &y).unwrap();
        let b = Smote::new().with_seed(7).fit_resample(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_sample_class_is_duplicated() {
        let x = array![[0.0], [1.0], [2.0], [9.0]];
        let y = array![0, 0, 0, 1];
        let result = Smote::new().fit_resample(&x, &y).unwrap();
        assert_eq!(result.x.nrows(), 6);
        assert!(result.x.rows().into_iter().skip(4).all(|r| r[0] == 9.0));
    }

    #[test]
    fn test_already_balanced_is_unchanged() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0, 1, 0, 1];
        let result = Smote::new().fit_resample(&x, &y).unwrap();
        assert_eq!(result.x, x);
        assert_eq!(result.total_synthetic(), 0);
    }

    #[test]
    fn test_single_class_fails() {
        let x = array![[0.0], [1.0]];
        let y = array![1, 1];
        let err = Smote::new().fit_resample(&x, &y).unwrap_err();
        assert_eq!(err.error_code(), "RESAMPLING_FAILED");
    }

    #[test]
    fn test_shape_mismatch() {
        let x = array![[0.0], [1.0]];
        let y = array![1];
        let err = Smote::new().fit_resample(&x, &y).unwrap_err();
        assert_eq!(err.error_code(), "FEATURE_MISMATCH");
    }
}
