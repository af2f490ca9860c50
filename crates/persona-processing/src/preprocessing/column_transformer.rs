//! Column-routing combinator.
//!
//! Routes disjoint column subsets to child pipelines and concatenates their
//! outputs left to right in branch order.

use super::{
    CategoricalPipeline, FittedCategoricalPipeline, FittedNumericPipeline, FittedTransformer,
    NumericPipeline, Transformer,
};
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::utils::{load_object, save_object};
use ndarray::{Array2, ArrayView2, Axis, concatenate};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Unfitted child pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Branch {
    Numeric(NumericPipeline),
    Categorical(CategoricalPipeline),
}

impl Branch {
    fn columns(&self) -> &[String] {
        match self {
            Branch::Numeric(p) => p.columns(),
            Branch::Categorical(p) => p.columns(),
        }
    }

    fn fit(&self, data: &DataFrame) -> Result<FittedBranch> {
        match self {
            Branch::Numeric(p) => p.fit(data).map(FittedBranch::Numeric),
            Branch::Categorical(p) => p.fit(data).map(FittedBranch::Categorical),
        }
    }
}

/// Fitted child pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FittedBranch {
    Numeric(FittedNumericPipeline),
    Categorical(FittedCategoricalPipeline),
}

impl FittedBranch {
    fn inner(&self) -> &dyn FittedTransformer {
        match self {
            FittedBranch::Numeric(t) => t,
            FittedBranch::Categorical(t) => t,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            FittedBranch::Numeric(_) => "numeric",
            FittedBranch::Categorical(_) => "categorical",
        }
    }
}

/// Unfitted column transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    branches: Vec<(String, Branch)>,
}

impl ColumnTransformer {
    /// Create a transformer from named branches.
    ///
    /// Fails if two branches claim the same column.
    pub fn new(branches: Vec<(String, Branch)>) -> Result<Self> {
        let mut seen = HashSet::new();
        for (name, branch) in &branches {
            for column in branch.columns() {
                if !seen.insert(column.as_str()) {
                    return Err(PreprocessingError::InvalidConfig(format!(
                        "column '{}' is routed to more than one branch (second: '{}')",
                        column, name
                    )));
                }
            }
        }
        Ok(Self { branches })
    }
}

impl Transformer for ColumnTransformer {
    type Fitted = FittedColumnTransformer;

    fn fit(&self, data: &DataFrame) -> Result<FittedColumnTransformer> {
        if data.height() == 0 {
            return Err(PreprocessingError::EmptyData("training features".to_string()));
        }

        let mut fitted = Vec::with_capacity(self.branches.len());
        for (name, branch) in &self.branches {
            let step = branch
                .fit(data)
                .context(format!("Fitting branch '{}'", name))?;
            debug!(
                "Branch '{}' fitted: {} -> {} features",
                name,
                branch.columns().len(),
                step.inner().n_features_out()
            );
            fitted.push((name.clone(), step));
        }

        let fitted = FittedColumnTransformer { branches: fitted };
        info!(
            "Column transformer fitted on {} rows: {} output features",
            data.height(),
            fitted.n_features_out()
        );
        Ok(fitted)
    }
}

/// Fitted column transformer; the object persisted for inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedColumnTransformer {
    branches: Vec<(String, FittedBranch)>,
}

impl FittedColumnTransformer {
    pub fn branches(&self) -> impl Iterator<Item = (&str, &FittedBranch)> {
        self.branches.iter().map(|(n, b)| (n.as_str(), b))
    }

    /// Persist to `path` as an opaque binary blob.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_object(path, self).context("Saving fitted transformer")
    }

    /// Restore a transformer written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_object(path).context("Loading fitted transformer")
    }

    fn check_columns(&self, data: &DataFrame) -> Result<()> {
        let present: HashSet<String> = data
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let missing: Vec<String> = self
            .input_columns()
            .into_iter()
            .filter(|c| !present.contains(c))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PreprocessingError::FeatureMismatch {
                expected: format!("columns {:?}", self.input_columns()),
                actual: format!("frame without {:?}", missing),
            })
        }
    }
}

impl FittedTransformer for FittedColumnTransformer {
    fn transform(&self, data: &DataFrame) -> Result<Array2<f64>> {
        self.check_columns(data)?;

        let mut blocks = Vec::with_capacity(self.branches.len());
        for (name, branch) in &self.branches {
            let block = branch
                .inner()
                .transform(data)
                .context(format!("Transforming {} branch '{}'", branch.kind(), name))?;
            blocks.push(block);
        }

        if blocks.is_empty() {
            return Ok(Array2::zeros((data.height(), 0)));
        }
        let views: Vec<ArrayView2<f64>> = blocks.iter().map(|b| b.view()).collect();
        concatenate(Axis(1), &views)
            .map_err(|e| PreprocessingError::Internal(format!("concatenating branches: {}", e)))
    }

    fn input_columns(&self) -> Vec<String> {
        self.branches
            .iter()
            .flat_map(|(_, b)| b.inner().input_columns())
            .collect()
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.branches
            .iter()
            .flat_map(|(_, b)| b.inner().feature_names_out())
            .collect()
    }

    fn n_features_out(&self) -> usize {
        self.branches
            .iter()
            .map(|(_, b)| b.inner().n_features_out())
            .sum()
    }
}

static_assertions::assert_impl_all!(FittedColumnTransformer: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn pipeline() -> ColumnTransformer {
        ColumnTransformer::new(vec![
            (
                "num".to_string(),
                Branch::Numeric(NumericPipeline::new(vec!["A".to_string()])),
            ),
            (
                "cat".to_string(),
                Branch::Categorical(CategoricalPipeline::new(vec!["B".to_string()])),
            ),
        ])
        .unwrap()
    }

    fn ten_rows() -> DataFrame {
        df![
            "A" => [Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0), Some(7.0), Some(8.0), Some(9.0), Some(10.0)],
            "B" => [Some("x"), Some("y"), Some("x"), None, Some("y"), Some("x"), Some("z"), Some("x"), Some("y"), Some("x")],
            "C" => ["p", "q", "p", "q", "p", "q", "p", "q", "p", "q"],
        ]
        .unwrap()
    }

    #[test]
    fn test_no_missing_values_after_transform() {
        let df = ten_rows();
        let (fitted, out) = pipeline().fit_transform(&df).unwrap();

        assert_eq!(out.shape(), &[10, 4]);
        assert!(out.iter().all(|v| v.is_finite()));
        assert_eq!(fitted.feature_names_out(), vec!["A", "B_x", "B_y", "B_z"]);
    }

    #[test]
    fn test_transform_is_deterministic() {
        let df = ten_rows();
        let (fitted, out) = pipeline().fit_transform(&df).unwrap();
        assert_eq!(fitted.transform(&df).unwrap(), out);
        assert_eq!(fitted.transform(&df).unwrap(), out);
    }

    #[test]
    fn test_transform_does_not_touch_fitted_state() {
        let fitted = pipeline().fit(&ten_rows()).unwrap();
        let snapshot = fitted.clone();
        let test = df![
            "A" => [100.0, -3.0],
            "B" => ["w", "y"],
        ]
        .unwrap();

        let out = fitted.transform(&test).unwrap();
        assert_eq!(fitted, snapshot);
        // unseen "w" encodes as all zeros in the B block
        assert_eq!(out.row(0).slice(ndarray::s![1..]).to_vec(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_overlapping_branches_rejected() {
        let err = ColumnTransformer::new(vec![
            (
                "num".to_string(),
                Branch::Numeric(NumericPipeline::new(vec!["A".to_string()])),
            ),
            (
                "cat".to_string(),
                Branch::Categorical(CategoricalPipeline::new(vec!["A".to_string()])),
            ),
        ])
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_missing_input_column() {
        let fitted = pipeline().fit(&ten_rows()).unwrap();
        let test = df!["A" => [1.0]].unwrap();
        let err = fitted.transform(&test).unwrap_err();
        assert_eq!(err.error_code(), "FEATURE_MISMATCH");
    }

    #[test]
    fn test_unparseable_numeric_text_is_an_error() {
        let train = df![
            "A" => [1.0, 2.0, 3.0],
            "B" => ["x", "y", "x"],
        ]
        .unwrap();
        let fitted = pipeline().fit(&train).unwrap();

        let test = df![
            "A" => ["1.5", "not-a-number"],
            "B" => ["x", "y"],
        ]
        .unwrap();
        let err = fitted.transform(&test).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_NUMERIC");
        assert!(matches!(
            err.root(),
            PreprocessingError::InvalidNumeric { row: 1, .. }
        ));
    }

    #[test]
    fn test_empty_training_frame() {
        let df = df!["A" => Vec::<f64>::new(), "B" => Vec::<String>::new()].unwrap();
        let err = pipeline().fit(&df).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_DATA");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessing.bin");
        let fitted = pipeline().fit(&ten_rows()).unwrap();

        fitted.save(&path).unwrap();
        let restored = FittedColumnTransformer::load(&path).unwrap();
        assert_eq!(restored, fitted);
        assert_eq!(
            restored.transform(&ten_rows()).unwrap(),
            fitted.transform(&ten_rows()).unwrap()
        );
    }
}
