//! Data validator implementation.

use crate::config::{ColumnCheckMode, PipelineConfig};
use crate::error::{Result, ResultExt};
use crate::schema::SchemaConfig;
use crate::types::{DataValidationArtifact, ValidationReport};
use crate::utils::{column_names, read_dataset, write_json_file};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

const TRAIN_COUNT_MISMATCH: &str = "Columns are missing in the training dataframe";
const TEST_COUNT_MISMATCH: &str = "Columns are missing in the test dataframe";
const TRAIN_REQUIRED_MISSING: &str = "Required columns are missing in the training dataframe";
const TEST_REQUIRED_MISSING: &str = "Required columns are missing in the test dataframe";

/// Required columns absent from a frame, split by schema group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnPresence {
    pub missing_numerical: Vec<String>,
    pub missing_categorical: Vec<String>,
}

impl ColumnPresence {
    /// Whether the frame passes under `mode`.
    ///
    /// `Lenient` fails only when both groups have missing entries;
    /// `Strict` fails on any missing column.
    pub fn passes(&self, mode: ColumnCheckMode) -> bool {
        let numerical_ok = self.missing_numerical.is_empty();
        let categorical_ok = self.missing_categorical.is_empty();
        match mode {
            ColumnCheckMode::Lenient => numerical_ok || categorical_ok,
            ColumnCheckMode::Strict => numerical_ok && categorical_ok,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing_numerical.is_empty() && self.missing_categorical.is_empty()
    }
}

/// Validates train/test frames against a [`SchemaConfig`].
#[derive(Debug, Clone)]
pub struct DataValidator {
    config: PipelineConfig,
    schema: SchemaConfig,
}

static_assertions::assert_impl_all!(DataValidator: Send);

impl DataValidator {
    pub fn new(config: PipelineConfig, schema: SchemaConfig) -> Self {
        Self { config, schema }
    }

    /// Build a validator, loading the schema from `config.schema_path`.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let schema = SchemaConfig::from_file(&config.schema_path)?;
        Ok(Self::new(config, schema))
    }

    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    /// True iff `df` has exactly as many columns as the schema declares.
    pub fn validate_column_count(&self, df: &DataFrame) -> bool {
        let status = df.width() == self.schema.column_count();
        debug!(
            "Column count check: found {}, expected {} -> {}",
            df.width(),
            self.schema.column_count(),
            status
        );
        status
    }

    /// Collect the schema's required columns that `df` lacks.
    pub fn missing_columns(&self, df: &DataFrame) -> ColumnPresence {
        let present: HashSet<String> = column_names(df).into_iter().collect();
        let missing = |required: &[String]| -> Vec<String> {
            required
                .iter()
                .filter(|c| !present.contains(*c))
                .cloned()
                .collect()
        };

        let presence = ColumnPresence {
            missing_numerical: missing(&self.schema.numerical_columns),
            missing_categorical: missing(&self.schema.categorical_columns),
        };
        if !presence.missing_numerical.is_empty() {
            info!("Missing numerical columns: {:?}", presence.missing_numerical);
        }
        if !presence.missing_categorical.is_empty() {
            info!("Missing categorical columns: {:?}", presence.missing_categorical);
        }
        presence
    }

    /// Required-column check under the configured [`ColumnCheckMode`].
    pub fn columns_present(&self, df: &DataFrame) -> bool {
        let presence = self.missing_columns(df);
        let status = presence.passes(self.config.column_check_mode);
        if status && !presence.is_complete() {
            warn!(
                "Required columns missing but tolerated by {:?} mode: {:?}",
                self.config.column_check_mode, presence
            );
        }
        status
    }

    /// Validate both splits and persist the report.
    ///
    /// Checks run in a fixed order: count on train, count on test, presence
    /// on train, presence on test. Returns `Err` only if the report cannot
    /// be written.
    pub fn run(&self, train_df: &DataFrame, test_df: &DataFrame) -> Result<ValidationReport> {
        info!("Starting data validation");
        let mut failures = Vec::new();

        if !self.validate_column_count(train_df) {
            failures.push(TRAIN_COUNT_MISMATCH.to_string());
        }
        if !self.validate_column_count(test_df) {
            failures.push(TEST_COUNT_MISMATCH.to_string());
        }
        if !self.columns_present(train_df) {
            failures.push(TRAIN_REQUIRED_MISSING.to_string());
        }
        if !self.columns_present(test_df) {
            failures.push(TEST_REQUIRED_MISSING.to_string());
        }

        let report = ValidationReport::from_failures(&failures);
        write_json_file(&self.config.validation_report_file_path, &report)
            .context("Writing validation report")?;

        if report.passed() {
            info!("Data validation passed");
        } else {
            warn!("Data validation failed: {}", report.message);
        }
        info!(
            "Validation report saved to {}",
            self.config.validation_report_file_path.display()
        );
        Ok(report)
    }

    /// Read the configured train/test files and validate them.
    pub fn validate_files(&self) -> Result<DataValidationArtifact> {
        let train_df = read_dataset(&self.config.train_file_path).context("Reading training split")?;
        let test_df = read_dataset(&self.config.test_file_path).context("Reading test split")?;

        let report = self.run(&train_df, &test_df)?;
        Ok(DataValidationArtifact::new(
            report,
            &self.config.validation_report_file_path,
        ))
    }
}
