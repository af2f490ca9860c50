//! Reports, summaries and artifacts produced by the validation and
//! transformation stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Outcome of one validation run, as persisted to the report file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub validation_status: bool,
    pub message: String,
}

impl ValidationReport {
    /// Build a report from the failure messages of a run.
    ///
    /// The status is `true` iff there are no messages.
    pub fn from_failures(failures: &[String]) -> Self {
        Self {
            validation_status: failures.is_empty(),
            message: failures.join("; ").trim().to_string(),
        }
    }

    pub fn passed(&self) -> bool {
        self.validation_status
    }
}

/// What the validation stage hands to the next stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    pub validation_status: bool,
    pub message: String,
    pub validation_report_file_path: PathBuf,
}

impl DataValidationArtifact {
    pub fn new(report: ValidationReport, path: impl Into<PathBuf>) -> Self {
        Self {
            validation_status: report.validation_status,
            message: report.message,
            validation_report_file_path: path.into(),
        }
    }
}

/// IQR fences computed for one numerical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
    /// Number of values moved onto a fence.
    pub clipped: usize,
}

impl OutlierBounds {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Summary of a transformation run.
///
/// Class counts are keyed by the original label so they stay readable in
/// the JSON output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformationSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
    /// RFC 3339 timestamp of when the artifacts were written.
    pub generated_at: String,

    pub train_rows: usize,
    pub test_rows: usize,
    /// Training rows after oversampling.
    pub train_rows_balanced: usize,
    /// Synthetic rows added by oversampling.
    pub synthetic_rows: usize,

    /// Width of the feature block (target column excluded).
    pub n_features_out: usize,
    pub feature_names: Vec<String>,

    pub class_counts_before: BTreeMap<String, usize>,
    pub class_counts_after: BTreeMap<String, usize>,

    pub outliers: Vec<OutlierBounds>,

    /// Warnings and notes generated during the run.
    pub warnings: Vec<String>,
}

impl TransformationSummary {
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Total number of values clipped across all columns.
    pub fn total_clipped(&self) -> usize {
        self.outliers.iter().map(|b| b.clipped).sum()
    }

    /// Ratio of the largest to the smallest class after balancing.
    ///
    /// 1.0 means perfectly balanced; `None` when there are no classes.
    pub fn imbalance_ratio_after(&self) -> Option<f64> {
        let max = self.class_counts_after.values().max()?;
        let min = self.class_counts_after.values().min()?;
        if *min == 0 {
            return None;
        }
        Some(*max as f64 / *min as f64)
    }
}

/// What the transformation stage hands to the training stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTransformationArtifact {
    pub transformed_object_file_path: PathBuf,
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
    pub summary: TransformationSummary,
}

/// Result of running validation followed by transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub validation: DataValidationArtifact,
    /// `None` when validation failed and transformation was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<DataTransformationArtifact>,
}

impl PipelineOutcome {
    pub fn succeeded(&self) -> bool {
        self.validation.validation_status && self.transformation.is_some()
    }
}
