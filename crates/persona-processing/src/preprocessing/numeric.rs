//! Numerical branch: impute, then standardize.

use super::{FittedTransformer, Transformer};
use crate::config::NumericImputation;
use crate::error::{Result, ResultExt};
use crate::imputers::StatisticalImputer;
use crate::utils::numeric_values;
use ndarray::Array2;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unfitted numerical pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericPipeline {
    columns: Vec<String>,
    imputation: NumericImputation,
}

impl NumericPipeline {
    /// Median imputation followed by standard scaling.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            imputation: NumericImputation::Median,
        }
    }

    pub fn with_imputation(mut self, imputation: NumericImputation) -> Self {
        self.imputation = imputation;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// Learned state for one numerical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumnState {
    pub column: String,
    pub fill_value: f64,
    pub mean: f64,
    /// Population standard deviation, or 1.0 for constant columns.
    pub scale: f64,
}

/// Fitted numerical pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedNumericPipeline {
    pub states: Vec<NumericColumnState>,
}

impl Transformer for NumericPipeline {
    type Fitted = FittedNumericPipeline;

    fn fit(&self, data: &DataFrame) -> Result<FittedNumericPipeline> {
        let mut states = Vec::with_capacity(self.columns.len());

        for column in &self.columns {
            let values = numeric_values(data, column)
                .context(format!("Fitting numerical column '{}'", column))?;
            let fill_value = StatisticalImputer::numeric_fill_value(column, &values, self.imputation)?;
            let filled = StatisticalImputer::fill_numeric(&values, fill_value);

            let n = filled.len().max(1) as f64;
            let mean = filled.iter().sum::<f64>() / n;
            let variance = filled.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            // Constant columns are centred but not scaled.
            let scale = if std.is_finite() && std > f64::EPSILON { std } else { 1.0 };

            debug!(
                "Numerical '{}': fill={:.4}, mean={:.4}, scale={:.4}",
                column, fill_value, mean, scale
            );
            states.push(NumericColumnState {
                column: column.clone(),
                fill_value,
                mean,
                scale,
            });
        }

        Ok(FittedNumericPipeline { states })
    }
}

impl FittedTransformer for FittedNumericPipeline {
    fn transform(&self, data: &DataFrame) -> Result<Array2<f64>> {
        let mut out = Array2::zeros((data.height(), self.states.len()));

        for (j, state) in self.states.iter().enumerate() {
            let values = numeric_values(data, &state.column)
                .context(format!("Transforming numerical column '{}'", state.column))?;
            for (i, value) in values.iter().enumerate() {
                let v = value.unwrap_or(state.fill_value);
                out[[i, j]] = (v - state.mean) / state.scale;
            }
        }

        Ok(out)
    }

    fn input_columns(&self) -> Vec<String> {
        self.states.iter().map(|s| s.column.clone()).collect()
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.input_columns()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreprocessingError;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_median_impute_then_scale() {
        let df = df![
            "a" => [Some(1.0), None, Some(3.0), Some(5.0)],
        ]
        .unwrap();

        let fitted = NumericPipeline::new(vec!["a".to_string()]).fit(&df).unwrap();
        let state = &fitted.states[0];
        assert_eq!(state.fill_value, 3.0);
        // imputed column is [1, 3, 3, 5]
        assert_eq!(state.mean, 3.0);
        assert!((state.scale - 2.0f64.sqrt()).abs() < 1e-12);

        let out = fitted.transform(&df).unwrap();
        assert_eq!(out.shape(), &[4, 1]);
        assert!((out[[1, 0]]).abs() < 1e-12);
        assert!((out.column(0).sum()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_is_centred_only() {
        let df = df!["a" => [2.0, 2.0, 2.0]].unwrap();
        let fitted = NumericPipeline::new(vec!["a".to_string()]).fit(&df).unwrap();
        assert_eq!(fitted.states[0].scale, 1.0);
        let out = fitted.transform(&df).unwrap();
        assert!(out.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_transform_uses_training_statistics() {
        let train = df!["a" => [0.0, 10.0]].unwrap();
        let test = df!["a" => [Some(20.0), None]].unwrap();

        let fitted = NumericPipeline::new(vec!["a".to_string()]).fit(&train).unwrap();
        let before = fitted.clone();
        let out = fitted.transform(&test).unwrap();

        // mean 5, std 5 from train; null filled with train median 5
        assert_eq!(out[[0, 0]], 3.0);
        assert_eq!(out[[1, 0]], 0.0);
        assert_eq!(fitted, before);
    }

    #[test]
    fn test_zero_imputation() {
        let df = df!["a" => [Some(1.0), None, Some(5.0)]].unwrap();
        let fitted = NumericPipeline::new(vec!["a".to_string()])
            .with_imputation(NumericImputation::Zero)
            .fit(&df)
            .unwrap();
        assert_eq!(fitted.states[0].fill_value, 0.0);
        // imputed column is [1, 0, 5]
        assert_eq!(fitted.states[0].mean, 2.0);
    }

    #[test]
    fn test_numeric_text_is_parsed() {
        let train = df!["a" => [1.0, 2.0, 3.0]].unwrap();
        let test = df!["a" => ["2", "3"]].unwrap();
        let fitted = NumericPipeline::new(vec!["a".to_string()]).fit(&train).unwrap();
        let out = fitted.transform(&test).unwrap();
        assert_eq!(out[[0, 0]], 0.0);
        assert!(out[[1, 0]] > 0.0);
    }

    #[test]
    fn test_unparseable_text_fails_instead_of_imputing() {
        let train = df!["a" => [1.0, 2.0, 3.0]].unwrap();
        let test = df!["a" => ["1.5", "not-a-number"]].unwrap();
        let fitted = NumericPipeline::new(vec!["a".to_string()]).fit(&train).unwrap();

        let err = fitted.transform(&test).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_NUMERIC");
        assert!(err.to_string().contains("not-a-number"));

        let bad_train = df!["a" => ["1", "two", "3"]].unwrap();
        let err = NumericPipeline::new(vec!["a".to_string()])
            .fit(&bad_train)
            .unwrap_err();
        assert!(matches!(
            err.root(),
            PreprocessingError::InvalidNumeric { row: 1, .. }
        ));
    }

    #[test]
    fn test_missing_column_fails() {
        let df = df!["a" => [1.0]].unwrap();
        let err = NumericPipeline::new(vec!["b".to_string()]).fit(&df).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }
}
