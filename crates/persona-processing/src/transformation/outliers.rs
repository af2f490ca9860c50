//! IQR outlier clipping for numerical columns.

use crate::error::{Result, ResultExt};
use crate::types::OutlierBounds;
use crate::utils::{numeric_values, quartiles};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Fence multiplier applied to the interquartile range.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Clips numerical columns to their IQR fences.
pub struct OutlierHandler;

impl OutlierHandler {
    /// Fences for one column, or `None` if it has no non-null values.
    pub fn fences(column: &str, values: &[Option<f64>]) -> Option<OutlierBounds> {
        let (q1, q3) = quartiles(values)?;
        let iqr = q3 - q1;
        Some(OutlierBounds {
            column: column.to_string(),
            q1,
            q3,
            lower: q1 - IQR_MULTIPLIER * iqr,
            upper: q3 + IQR_MULTIPLIER * iqr,
            clipped: 0,
        })
    }

    /// Clip every listed column present in `df` to `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`.
    ///
    /// Returns the clipped copy and the bounds used per column. Nulls stay
    /// null and the row count never changes. Listed columns absent from the
    /// frame are skipped; text that does not parse as a number fails with
    /// [`PreprocessingError::InvalidNumeric`](crate::error::PreprocessingError::InvalidNumeric).
    pub fn clip_outliers(
        df: &DataFrame,
        columns: &[String],
    ) -> Result<(DataFrame, Vec<OutlierBounds>)> {
        info!("Handling outliers using the IQR method");
        let mut out = df.clone();
        let mut bounds = Vec::with_capacity(columns.len());

        for column in columns {
            let Ok(col) = df.column(column) else {
                warn!("Outlier column '{}' not in frame, skipping", column);
                continue;
            };
            let values = numeric_values(df, column)?;
            let Some(mut fence) = Self::fences(column, &values) else {
                warn!("Column '{}' has no values to compute quartiles from", column);
                continue;
            };

            let (clipped, count) =
                clip_series(col.as_materialized_series(), fence.lower, fence.upper)
                    .context(format!("Clipping column '{}'", column))?;
            out.replace(column, clipped)?;

            fence.clipped = count;
            debug!(
                "'{}': Q1={}, Q3={}, fences=[{}, {}], clipped {}",
                column, fence.q1, fence.q3, fence.lower, fence.upper, count
            );
            bounds.push(fence);
        }

        info!(
            "Outliers handled for {} numerical column(s), {} value(s) clipped",
            bounds.len(),
            bounds.iter().map(|b| b.clipped).sum::<usize>()
        );
        Ok((out, bounds))
    }
}

fn clip_series(series: &Series, lower: f64, upper: f64) -> PolarsResult<(Series, usize)> {
    let float_series = series.cast(&DataType::Float64)?;
    let values = float_series.f64()?;

    let outside = values
        .into_iter()
        .flatten()
        .filter(|v| *v < lower || *v > upper)
        .count();
    let clipped = values.apply(|v| v.map(|val| val.clamp(lower, upper)));

    Ok((clipped.into_series(), outside))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clips_to_fences() {
        let df = df![
            "x" => [1.0, 2.0, 3.0, 4.0, 5.0, 100.0],
        ]
        .unwrap();

        let (out, bounds) = OutlierHandler::clip_outliers(&df, &cols(&["x"])).unwrap();
        // Q1 = sorted[1] = 2, Q3 = sorted[4] = 5, IQR = 3
        assert_eq!(bounds[0].q1, 2.0);
        assert_eq!(bounds[0].q3, 5.0);
        assert_eq!(bounds[0].upper, 9.5);
        assert_eq!(bounds[0].clipped, 1);

        let values = numeric_values(&out, "x").unwrap();
        assert_eq!(values[5], Some(9.5));
        assert_eq!(values[0], Some(1.0));
    }

    #[test]
    fn test_clipping_is_idempotent() {
        let df = df![
            "x" => [Some(0.0), Some(100.0), Some(100.0), Some(100.0), None, Some(-50.0), Some(7.0)],
            "y" => [Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(30.0)],
        ]
        .unwrap();
        let columns = cols(&["x", "y"]);

        let (once, _) = OutlierHandler::clip_outliers(&df, &columns).unwrap();
        let (twice, bounds) = OutlierHandler::clip_outliers(&once, &columns).unwrap();

        for column in &columns {
            assert_eq!(
                numeric_values(&once, column).unwrap(),
                numeric_values(&twice, column).unwrap()
            );
        }
        assert!(bounds.iter().all(|b| b.clipped == 0));
    }

    #[test]
    fn test_nulls_and_row_count_preserved() {
        let df = df![
            "x" => [Some(1.0), None, Some(2.0), Some(3.0), Some(1000.0)],
        ]
        .unwrap();
        let (out, _) = OutlierHandler::clip_outliers(&df, &cols(&["x"])).unwrap();
        assert_eq!(out.height(), 5);
        assert_eq!(numeric_values(&out, "x").unwrap()[1], None);
    }

    #[test]
    fn test_unlisted_and_absent_columns_untouched() {
        let df = df![
            "x" => [1.0, 2.0, 3.0, 400.0],
            "y" => [1.0, 2.0, 3.0, 400.0],
            "s" => ["a", "b", "c", "d"],
        ]
        .unwrap();
        let (out, bounds) =
            OutlierHandler::clip_outliers(&df, &cols(&["x", "missing"])).unwrap();

        assert_eq!(bounds.len(), 1);
        assert_eq!(
            numeric_values(&out, "y").unwrap(),
            numeric_values(&df, "y").unwrap()
        );
        assert_eq!(out.column("s").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_integer_column_is_clipped_as_float() {
        let df = df!["n" => [1i64, 2, 3, 4, 5, 500]].unwrap();
        let (out, bounds) = OutlierHandler::clip_outliers(&df, &cols(&["n"])).unwrap();
        assert_eq!(out.column("n").unwrap().dtype(), &DataType::Float64);
        assert_eq!(bounds[0].clipped, 1);
    }

    #[test]
    fn test_numeric_text_column_is_clipped() {
        let df = df!["t" => ["1", "2", "3", "4", "5", "100"]].unwrap();
        let (out, bounds) = OutlierHandler::clip_outliers(&df, &cols(&["t"])).unwrap();
        assert_eq!(bounds[0].clipped, 1);
        assert_eq!(numeric_values(&out, "t").unwrap()[5], Some(9.5));
    }

    #[test]
    fn test_unparseable_text_fails() {
        let df = df!["t" => [Some("1"), None, Some("many"), Some("4")]].unwrap();
        let err = OutlierHandler::clip_outliers(&df, &cols(&["t"])).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_NUMERIC");
        assert!(err.to_string().contains("many"));
    }

    #[test]
    fn test_all_null_column_is_skipped() {
        let df = df!["x" => [None::<f64>, None]].unwrap();
        let (out, bounds) = OutlierHandler::clip_outliers(&df, &cols(&["x"])).unwrap();
        assert!(bounds.is_empty());
        assert_eq!(out.height(), 2);
    }
}
