//! Statistical imputation methods.
//!
//! Fill values are learned once from training values and then applied to
//! any split. Learning and filling are separate so a fitted transformer can
//! carry the fill value without the data it came from.

use crate::config::{CategoricalImputation, NumericImputation};
use crate::error::{PreprocessingError, Result};
use crate::utils::{mean, median, mode};
use tracing::debug;

/// Placeholder used by [`CategoricalImputation::Constant`].
pub const MISSING_CATEGORY: &str = "missing";

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Learn the numeric fill value for one column.
    ///
    /// Fails with [`PreprocessingError::NoValidValues`] when the strategy
    /// needs data and the column has none.
    pub fn numeric_fill_value(
        column: &str,
        values: &[Option<f64>],
        strategy: NumericImputation,
    ) -> Result<f64> {
        let fill = match strategy {
            NumericImputation::Median => median(values),
            NumericImputation::Mean => mean(values),
            NumericImputation::Zero => Some(0.0),
        }
        .ok_or_else(|| PreprocessingError::NoValidValues(column.to_string()))?;

        debug!("Learned {:?} fill for '{}': {:.4}", strategy, column, fill);
        Ok(fill)
    }

    /// Learn the categorical fill value for one column.
    pub fn categorical_fill_value(
        column: &str,
        values: &[Option<String>],
        strategy: CategoricalImputation,
    ) -> Result<String> {
        let fill = match strategy {
            CategoricalImputation::Mode => mode(values.iter().map(|v| v.as_deref())),
            CategoricalImputation::Constant => Some(MISSING_CATEGORY.to_string()),
        }
        .ok_or_else(|| PreprocessingError::NoValidValues(column.to_string()))?;

        debug!("Learned {:?} fill for '{}': '{}'", strategy, column, fill);
        Ok(fill)
    }

    /// Replace missing numeric values with `fill`.
    pub fn fill_numeric(values: &[Option<f64>], fill: f64) -> Vec<f64> {
        values.iter().map(|v| v.unwrap_or(fill)).collect()
    }

    /// Replace missing categorical values with `fill`.
    pub fn fill_categorical(values: Vec<Option<String>>, fill: &str) -> Vec<String> {
        values
            .into_iter()
            .map(|v| v.unwrap_or_else(|| fill.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ========================================================================
    // numeric_fill_value() tests
    // ========================================================================

    #[test]
    fn test_numeric_median() {
        let values = [Some(1.0), None, Some(3.0), None, Some(5.0)];
        let fill =
            StatisticalImputer::numeric_fill_value("values", &values, NumericImputation::Median)
                .unwrap();
        // Median of [1, 3, 5] = 3
        assert_eq!(fill, 3.0);
        assert_eq!(
            StatisticalImputer::fill_numeric(&values, fill),
            vec![1.0, 3.0, 3.0, 3.0, 5.0]
        );
    }

    #[test]
    fn test_numeric_mean_and_zero() {
        let values = [Some(1.0), Some(2.0), None, Some(6.0)];
        assert_eq!(
            StatisticalImputer::numeric_fill_value("v", &values, NumericImputation::Mean).unwrap(),
            3.0
        );
        assert_eq!(
            StatisticalImputer::numeric_fill_value("v", &[None], NumericImputation::Zero).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_numeric_all_null_fails() {
        let err = StatisticalImputer::numeric_fill_value(
            "Going_outside",
            &[None, None],
            NumericImputation::Median,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "NO_VALID_VALUES");
        assert!(err.to_string().contains("Going_outside"));
    }

    // ========================================================================
    // categorical_fill_value() tests
    // ========================================================================

    #[test]
    fn test_categorical_mode() {
        let values = vec![
            Some("Yes".to_string()),
            None,
            Some("No".to_string()),
            Some("Yes".to_string()),
        ];
        let fill =
            StatisticalImputer::categorical_fill_value("Stage_fear", &values, CategoricalImputation::Mode)
                .unwrap();
        assert_eq!(fill, "Yes");
        assert_eq!(
            StatisticalImputer::fill_categorical(values, &fill),
            vec!["Yes", "Yes", "No", "Yes"]
        );
    }

    #[test]
    fn test_categorical_constant() {
        let fill = StatisticalImputer::categorical_fill_value(
            "Stage_fear",
            &[None],
            CategoricalImputation::Constant,
        )
        .unwrap();
        assert_eq!(fill, MISSING_CATEGORY);
    }

    #[test]
    fn test_categorical_all_null_mode_fails() {
        let err = StatisticalImputer::categorical_fill_value(
            "Stage_fear",
            &[None, None],
            CategoricalImputation::Mode,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "NO_VALID_VALUES");
    }
}
