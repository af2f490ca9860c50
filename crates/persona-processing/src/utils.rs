//! Shared utilities for the validation and transformation stages.
//!
//! Dataset/artifact I/O and the small column statistics both stages need.

use crate::error::{PreprocessingError, Result, ResultExt};
use ndarray::Array2;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Positional layout of the raw personality dataset.
pub const CANONICAL_COLUMNS: [&str; 8] = [
    "Time_spent_Alone",
    "Stage_fear",
    "Social_event_attendance",
    "Going_outside",
    "Drained_after_socializing",
    "Friends_circle_size",
    "Post_frequency",
    "Personality",
];

// =============================================================================
// Frame Utilities
// =============================================================================

/// Names of a frame's columns as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// Column Extraction
// =============================================================================

fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| PreprocessingError::ColumnNotFound(name.to_string()))
}

/// Values of a column as `f64`, with nulls and NaN mapped to `None`.
///
/// Non-numeric columns are cast. An entry that is present but does not
/// parse as a number is an [`PreprocessingError::InvalidNumeric`].
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let original = series(df, name)?;
    let cast = original
        .cast(&DataType::Float64)
        .context(format!("Failed to cast column '{}' to Float64", name))?;
    let floats = cast
        .f64()
        .context(format!("Column '{}' is not Float64 after cast", name))?;

    if cast.null_count() > original.null_count() {
        let raw = string_values(df, name)?;
        let bad = raw
            .into_iter()
            .zip(floats.into_iter())
            .enumerate()
            .find_map(|(row, (raw, parsed))| match (raw, parsed) {
                (Some(value), None) => Some((row, value)),
                _ => None,
            });
        if let Some((row, value)) = bad {
            return Err(PreprocessingError::InvalidNumeric {
                column: name.to_string(),
                row,
                value,
            });
        }
    }

    Ok(floats
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Values of a column as strings, with nulls mapped to `None`.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let cast = series(df, name)?
        .cast(&DataType::String)
        .context(format!("Failed to cast column '{}' to String", name))?;
    let values = cast
        .str()
        .context(format!("Column '{}' is not String after cast", name))?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

// =============================================================================
// Statistics
// =============================================================================

fn sorted_present(values: &[Option<f64>]) -> Vec<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    present.sort_by(|a, b| a.total_cmp(b));
    present
}

/// Median of the non-null values (mean of the two middle values for even counts).
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let sorted = sorted_present(values);
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// Mean of the non-null values.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    Some(present.iter().sum::<f64>() / present.len() as f64)
}

/// First and third quartiles of the non-null values.
///
/// Q1 is the order statistic at or below the 25% position and Q3 the one at
/// or above the 75% position, so both are always observed values. This is
/// numpy's `lower`/`higher` method, not the default `linear` one used by
/// pandas: fences can differ from `Series.quantile` output. Interpolated
/// quartiles move when the extremes are clipped (`[0, 100, 100, 100]` puts
/// Q1 at 75, clipping 0 to 37.5 moves it), observed ones do not.
pub fn quartiles(values: &[Option<f64>]) -> Option<(f64, f64)> {
    let sorted = sorted_present(values);
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let last = (n - 1) as f64;
    let q1_idx = (0.25 * last).floor() as usize;
    let q3_idx = ((0.75 * last).ceil() as usize).min(n - 1);
    Some((sorted[q1_idx], sorted[q3_idx]))
}

/// Most frequent non-null value. Ties go to the lexicographically smallest.
pub fn mode<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }

    // BTreeMap iterates in key order; keep the first key reaching the max count.
    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string())
}

// =============================================================================
// Dataset I/O
// =============================================================================

/// Read a CSV split.
///
/// The file must have a header row. When it has exactly as many columns as
/// [`CANONICAL_COLUMNS`], its header is replaced positionally by the
/// canonical names.
pub fn read_dataset(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .context(format!("Failed to open {}", path.display()))?
        .finish()
        .context(format!("Failed to parse {}", path.display()))?;

    if df.width() == CANONICAL_COLUMNS.len() {
        let current = column_names(&df);
        if current.iter().zip(CANONICAL_COLUMNS).any(|(a, b)| a != b) {
            debug!("Renaming columns of {} to the canonical layout", path.display());
            df.set_column_names(CANONICAL_COLUMNS)
                .context("Failed to apply canonical column names")?;
        }
    } else {
        warn!(
            "{} has {} columns, expected {}; keeping its header names",
            path.display(),
            df.width(),
            CANONICAL_COLUMNS.len()
        );
    }

    debug!("Loaded {} with shape {:?}", path.display(), df.shape());
    Ok(df)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Read and deserialize a YAML file.
pub fn read_yaml_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .context(format!("Failed to read {}", path.display()))?;
    let value = serde_yaml::from_str(&text)?;
    Ok(value)
}

/// Write a value as pretty-printed JSON, creating parent directories.
pub fn write_json_file<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).context(format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Persist any serializable object as an opaque binary artifact.
pub fn save_object<T: Serialize>(path: impl AsRef<Path>, object: &T) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let bytes = bincode::serialize(object)?;
    std::fs::write(path, bytes).context(format!("Failed to write {}", path.display()))?;
    debug!("Saved object to {}", path.display());
    Ok(())
}

/// Load an object written by [`save_object`].
pub fn load_object<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).context(format!("Failed to read {}", path.display()))?;
    let object = bincode::deserialize(&bytes)?;
    Ok(object)
}

/// Persist a numeric matrix.
pub fn save_array(path: impl AsRef<Path>, array: &Array2<f64>) -> Result<()> {
    save_object(path, array)
}

/// Load a matrix written by [`save_array`].
pub fn load_array(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    load_object(path)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[Some(3.0), None, Some(1.0), Some(2.0)]), Some(2.0));
        assert_eq!(median(&[Some(4.0), Some(1.0), Some(2.0), Some(3.0)]), Some(2.5));
        assert_eq!(median(&[None, None]), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_quartiles_are_observed_values() {
        let values: Vec<Option<f64>> = (1..=10).map(|v| Some(v as f64)).collect();
        // positions 2.25 and 6.75 over sorted 1..=10
        assert_eq!(quartiles(&values), Some((3.0, 8.0)));
        assert_eq!(quartiles(&[Some(5.0)]), Some((5.0, 5.0)));
        assert_eq!(quartiles(&[None]), None);
    }

    #[test]
    fn test_quartiles_do_not_interpolate() {
        // linear interpolation would give Q1 = 75 here
        let values = [Some(0.0), Some(100.0), Some(100.0), Some(100.0)];
        assert_eq!(quartiles(&values), Some((0.0, 100.0)));
    }

    #[test]
    fn test_mode_tie_breaks_lexicographically() {
        let values = vec![Some("No"), Some("Yes"), None, Some("Yes"), Some("No")];
        assert_eq!(mode(values), Some("No".to_string()));
        assert_eq!(mode(vec![Some("b"), Some("a"), Some("b")]), Some("b".to_string()));
        assert_eq!(mode(Vec::<Option<&str>>::new()), None);
    }

    #[test]
    fn test_numeric_values_handles_nulls() {
        let df = df!["a" => [Some(1i64), None, Some(3)]].unwrap();
        assert_eq!(numeric_values(&df, "a").unwrap(), vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_numeric_values_parses_text() {
        let df = df!["a" => [Some("1.5"), None, Some("2")]].unwrap();
        assert_eq!(numeric_values(&df, "a").unwrap(), vec![Some(1.5), None, Some(2.0)]);
    }

    #[test]
    fn test_numeric_values_rejects_unparseable_text() {
        let df = df!["a" => [Some("1.5"), None, Some("lots")]].unwrap();
        let err = numeric_values(&df, "a").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_NUMERIC");
        assert!(matches!(
            err,
            PreprocessingError::InvalidNumeric { ref column, row: 2, ref value }
                if column == "a" && value == "lots"
        ));
    }

    #[test]
    fn test_string_values_missing_column() {
        let df = df!["a" => ["x", "y"]].unwrap();
        let err = string_values(&df, "b").unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_read_dataset_renames_positionally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        std::fs::write(
            &path,
            "a,b,c,d,e,f,g,h\n1.0,No,4.0,6.0,No,13.0,5.0,Extrovert\n",
        )
        .unwrap();

        let df = read_dataset(&path).unwrap();
        assert_eq!(column_names(&df), CANONICAL_COLUMNS.to_vec());
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_read_dataset_keeps_unexpected_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        std::fs::write(&path, "x,y\n1,2\n").unwrap();

        let df = read_dataset(&path).unwrap();
        assert_eq!(column_names(&df), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_array_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/arrays/train.bin");
        let array = array![[1.0, 2.0, 0.0], [3.5, -1.0, 1.0]];

        save_array(&path, &array).unwrap();
        assert_eq!(load_array(&path).unwrap(), array);
    }

    #[test]
    fn test_write_json_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/report.json");
        write_json_file(&path, &serde_json::json!({"ok": true})).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"ok\": true"));
    }
}
