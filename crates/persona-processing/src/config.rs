//! Configuration types for the validation and transformation stages.
//!
//! This module provides configuration options using the builder pattern.
//! Every output location derives from `artifact_dir` unless set explicitly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the label column.
pub const TARGET_COLUMN: &str = "Personality";

/// Default location of the schema file.
pub const SCHEMA_FILE_PATH: &str = "config/schema.yaml";

/// Default root for every artifact the stages write.
pub const ARTIFACT_DIR: &str = "artifact";

const VALIDATION_DIR: &str = "data_validation";
const VALIDATION_REPORT_FILE: &str = "report.json";
const TRANSFORMATION_DIR: &str = "data_transformation";
const TRANSFORMED_DATA_DIR: &str = "transformed";
const TRANSFORMED_OBJECT_DIR: &str = "transformed_object";
const PREPROCESSING_OBJECT_FILE: &str = "preprocessing.bin";
const TRAIN_ARRAY_FILE: &str = "train.bin";
const TEST_ARRAY_FILE: &str = "test.bin";

/// How the required-column check decides pass/fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColumnCheckMode {
    /// Fail only when both the numerical and the categorical groups are
    /// missing entries.
    #[default]
    Lenient,
    /// Fail when any required column is missing.
    Strict,
}

/// Strategy for handling outliers in numeric columns of the training split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutlierStrategy {
    /// Clip values to the IQR fences (Q1 - 1.5*IQR, Q3 + 1.5*IQR)
    #[default]
    Clip,
    /// Keep outliers as-is (no handling)
    Keep,
}

/// Strategy for imputing missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NumericImputation {
    /// Use the mean of non-null values
    Mean,
    /// Use the median of non-null values
    #[default]
    Median,
    /// Use a constant value (0.0)
    Zero,
}

/// Strategy for imputing missing categorical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CategoricalImputation {
    /// Use the most frequent value (mode)
    #[default]
    Mode,
    /// Use a constant value ("missing")
    Constant,
}

/// What the one-hot encoder does with a category it never saw during fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HandleUnknown {
    /// Encode as an all-zero row for that column
    #[default]
    Ignore,
    /// Fail the transform
    Error,
}

/// Configuration for the validation and transformation stages.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use persona_processing::config::{ColumnCheckMode, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .train_file_path("data/train.csv")
///     .test_file_path("data/test.csv")
///     .artifact_dir("artifact/run_01")
///     .column_check_mode(ColumnCheckMode::Strict)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// YAML schema describing the expected columns.
    /// Default: "config/schema.yaml"
    pub schema_path: PathBuf,

    /// Raw training split.
    /// Default: "<artifact_dir>/data_ingestion/ingested/train.csv"
    pub train_file_path: PathBuf,

    /// Raw test split.
    /// Default: "<artifact_dir>/data_ingestion/ingested/test.csv"
    pub test_file_path: PathBuf,

    /// Root directory for every artifact.
    /// Default: "artifact"
    pub artifact_dir: PathBuf,

    /// Where the validation report JSON is written.
    /// Default: "<artifact_dir>/data_validation/report.json"
    pub validation_report_file_path: PathBuf,

    /// Where the fitted transformer is written.
    /// Default: "<artifact_dir>/data_transformation/transformed_object/preprocessing.bin"
    pub transformed_object_file_path: PathBuf,

    /// Where the transformed training matrix is written.
    /// Default: "<artifact_dir>/data_transformation/transformed/train.bin"
    pub transformed_train_file_path: PathBuf,

    /// Where the transformed test matrix is written.
    /// Default: "<artifact_dir>/data_transformation/transformed/test.bin"
    pub transformed_test_file_path: PathBuf,

    /// Label column.
    /// Default: "Personality"
    pub target_column: String,

    /// Pass/fail rule for the required-column check.
    /// Default: Lenient
    pub column_check_mode: ColumnCheckMode,

    /// Outlier handling on the training split.
    /// Default: Clip
    pub outlier_strategy: OutlierStrategy,

    /// Imputation for numerical features.
    /// Default: Median
    pub numeric_imputation: NumericImputation,

    /// Imputation for categorical features.
    /// Default: Mode
    pub categorical_imputation: CategoricalImputation,

    /// One-hot behaviour for categories unseen during fitting.
    /// Default: Ignore
    pub handle_unknown: HandleUnknown,

    /// Whether to oversample minority classes in the training split.
    /// Default: true
    pub balance_classes: bool,

    /// Neighbours considered when synthesizing a minority sample.
    /// Default: 5
    pub smote_k_neighbors: usize,

    /// Seed for the oversampler.
    /// Default: 42
    pub random_state: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let artifact_dir = PathBuf::from(ARTIFACT_DIR);
        Self {
            schema_path: PathBuf::from(SCHEMA_FILE_PATH),
            train_file_path: default_ingested_path(&artifact_dir, "train.csv"),
            test_file_path: default_ingested_path(&artifact_dir, "test.csv"),
            validation_report_file_path: default_report_path(&artifact_dir),
            transformed_object_file_path: default_object_path(&artifact_dir),
            transformed_train_file_path: default_array_path(&artifact_dir, TRAIN_ARRAY_FILE),
            transformed_test_file_path: default_array_path(&artifact_dir, TEST_ARRAY_FILE),
            artifact_dir,
            target_column: TARGET_COLUMN.to_string(),
            column_check_mode: ColumnCheckMode::default(),
            outlier_strategy: OutlierStrategy::default(),
            numeric_imputation: NumericImputation::default(),
            categorical_imputation: CategoricalImputation::default(),
            handle_unknown: HandleUnknown::default(),
            balance_classes: true,
            smote_k_neighbors: 5,
            random_state: 42,
        }
    }
}

fn default_ingested_path(artifact_dir: &Path, file: &str) -> PathBuf {
    artifact_dir.join("data_ingestion").join("ingested").join(file)
}

fn default_report_path(artifact_dir: &Path) -> PathBuf {
    artifact_dir.join(VALIDATION_DIR).join(VALIDATION_REPORT_FILE)
}

fn default_object_path(artifact_dir: &Path) -> PathBuf {
    artifact_dir
        .join(TRANSFORMATION_DIR)
        .join(TRANSFORMED_OBJECT_DIR)
        .join(PREPROCESSING_OBJECT_FILE)
}

fn default_array_path(artifact_dir: &Path, file: &str) -> PathBuf {
    artifact_dir
        .join(TRANSFORMATION_DIR)
        .join(TRANSFORMED_DATA_DIR)
        .join(file)
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.target_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyTargetColumn);
        }

        if self.smote_k_neighbors == 0 {
            return Err(ConfigValidationError::InvalidKNeighbors(
                self.smote_k_neighbors,
            ));
        }

        let outputs = [
            ("transformed_object_file_path", &self.transformed_object_file_path),
            ("transformed_train_file_path", &self.transformed_train_file_path),
            ("transformed_test_file_path", &self.transformed_test_file_path),
        ];
        for (i, (field, path)) in outputs.iter().enumerate() {
            if outputs[..i].iter().any(|(_, other)| other == path) {
                return Err(ConfigValidationError::DuplicateOutputPath {
                    field: field.to_string(),
                    path: path.display().to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Target column must not be empty")]
    EmptyTargetColumn,

    #[error("Invalid SMOTE neighbours: {0} (must be at least 1)")]
    InvalidKNeighbors(usize),

    #[error("Output path for '{field}' collides with another output: {path}")]
    DuplicateOutputPath { field: String, path: String },
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    schema_path: Option<PathBuf>,
    train_file_path: Option<PathBuf>,
    test_file_path: Option<PathBuf>,
    artifact_dir: Option<PathBuf>,
    validation_report_file_path: Option<PathBuf>,
    transformed_object_file_path: Option<PathBuf>,
    transformed_train_file_path: Option<PathBuf>,
    transformed_test_file_path: Option<PathBuf>,
    target_column: Option<String>,
    column_check_mode: Option<ColumnCheckMode>,
    outlier_strategy: Option<OutlierStrategy>,
    numeric_imputation: Option<NumericImputation>,
    categorical_imputation: Option<CategoricalImputation>,
    handle_unknown: Option<HandleUnknown>,
    balance_classes: Option<bool>,
    smote_k_neighbors: Option<usize>,
    random_state: Option<u64>,
}

impl PipelineConfigBuilder {
    /// Set the schema file location.
    pub fn schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = Some(path.into());
        self
    }

    /// Set the raw training CSV.
    pub fn train_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.train_file_path = Some(path.into());
        self
    }

    /// Set the raw test CSV.
    pub fn test_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.test_file_path = Some(path.into());
        self
    }

    /// Set the artifact root.
    ///
    /// Output paths that are not set explicitly are placed under it.
    pub fn artifact_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(path.into());
        self
    }

    pub fn validation_report_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.validation_report_file_path = Some(path.into());
        self
    }

    pub fn transformed_object_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.transformed_object_file_path = Some(path.into());
        self
    }

    pub fn transformed_train_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.transformed_train_file_path = Some(path.into());
        self
    }

    pub fn transformed_test_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.transformed_test_file_path = Some(path.into());
        self
    }

    /// Set the label column.
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Set the pass/fail rule for the required-column check.
    pub fn column_check_mode(mut self, mode: ColumnCheckMode) -> Self {
        self.column_check_mode = Some(mode);
        self
    }

    /// Set the strategy for handling outliers.
    pub fn outlier_strategy(mut self, strategy: OutlierStrategy) -> Self {
        self.outlier_strategy = Some(strategy);
        self
    }

    /// Set the numeric imputation strategy.
    pub fn numeric_imputation(mut self, strategy: NumericImputation) -> Self {
        self.numeric_imputation = Some(strategy);
        self
    }

    /// Set the categorical imputation strategy.
    pub fn categorical_imputation(mut self, strategy: CategoricalImputation) -> Self {
        self.categorical_imputation = Some(strategy);
        self
    }

    /// Set how unseen categories are encoded.
    pub fn handle_unknown(mut self, handling: HandleUnknown) -> Self {
        self.handle_unknown = Some(handling);
        self
    }

    /// Enable or disable minority oversampling.
    pub fn balance_classes(mut self, balance: bool) -> Self {
        self.balance_classes = Some(balance);
        self
    }

    /// Set the neighbour count used by the oversampler.
    pub fn smote_k_neighbors(mut self, k: usize) -> Self {
        self.smote_k_neighbors = Some(k);
        self
    }

    /// Set the oversampler seed.
    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let artifact_dir = self
            .artifact_dir
            .unwrap_or_else(|| PathBuf::from(ARTIFACT_DIR));

        let config = PipelineConfig {
            schema_path: self
                .schema_path
                .unwrap_or_else(|| PathBuf::from(SCHEMA_FILE_PATH)),
            train_file_path: self
                .train_file_path
                .unwrap_or_else(|| default_ingested_path(&artifact_dir, "train.csv")),
            test_file_path: self
                .test_file_path
                .unwrap_or_else(|| default_ingested_path(&artifact_dir, "test.csv")),
            validation_report_file_path: self
                .validation_report_file_path
                .unwrap_or_else(|| default_report_path(&artifact_dir)),
            transformed_object_file_path: self
                .transformed_object_file_path
                .unwrap_or_else(|| default_object_path(&artifact_dir)),
            transformed_train_file_path: self
                .transformed_train_file_path
                .unwrap_or_else(|| default_array_path(&artifact_dir, TRAIN_ARRAY_FILE)),
            transformed_test_file_path: self
                .transformed_test_file_path
                .unwrap_or_else(|| default_array_path(&artifact_dir, TEST_ARRAY_FILE)),
            artifact_dir,
            target_column: self
                .target_column
                .unwrap_or_else(|| TARGET_COLUMN.to_string()),
            column_check_mode: self.column_check_mode.unwrap_or_default(),
            outlier_strategy: self.outlier_strategy.unwrap_or_default(),
            numeric_imputation: self.numeric_imputation.unwrap_or_default(),
            categorical_imputation: self.categorical_imputation.unwrap_or_default(),
            handle_unknown: self.handle_unknown.unwrap_or_default(),
            balance_classes: self.balance_classes.unwrap_or(true),
            smote_k_neighbors: self.smote_k_neighbors.unwrap_or(5),
            random_state: self.random_state.unwrap_or(42),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.target_column, "Personality");
        assert_eq!(config.column_check_mode, ColumnCheckMode::Lenient);
        assert_eq!(config.outlier_strategy, OutlierStrategy::Clip);
        assert_eq!(config.smote_k_neighbors, 5);
        assert_eq!(config.random_state, 42);
        assert!(config.balance_classes);
        assert_eq!(
            config.validation_report_file_path,
            PathBuf::from("artifact/data_validation/report.json")
        );
    }

    #[test]
    fn test_builder_derives_paths_from_artifact_dir() {
        let config = PipelineConfig::builder()
            .artifact_dir("runs/42")
            .build()
            .unwrap();

        assert_eq!(
            config.transformed_object_file_path,
            PathBuf::from("runs/42/data_transformation/transformed_object/preprocessing.bin")
        );
        assert_eq!(
            config.transformed_train_file_path,
            PathBuf::from("runs/42/data_transformation/transformed/train.bin")
        );
        assert_eq!(
            config.transformed_test_file_path,
            PathBuf::from("runs/42/data_transformation/transformed/test.bin")
        );
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .target_column("label")
            .column_check_mode(ColumnCheckMode::Strict)
            .outlier_strategy(OutlierStrategy::Keep)
            .smote_k_neighbors(3)
            .random_state(7)
            .balance_classes(false)
            .build()
            .unwrap();

        assert_eq!(config.target_column, "label");
        assert_eq!(config.column_check_mode, ColumnCheckMode::Strict);
        assert_eq!(config.outlier_strategy, OutlierStrategy::Keep);
        assert_eq!(config.smote_k_neighbors, 3);
        assert_eq!(config.random_state, 7);
        assert!(!config.balance_classes);
    }

    #[test]
    fn test_validation_invalid_k_neighbors() {
        let result = PipelineConfig::builder().smote_k_neighbors(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidKNeighbors(0)
        ));
    }

    #[test]
    fn test_validation_empty_target() {
        let result = PipelineConfig::builder().target_column("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyTargetColumn
        ));
    }

    #[test]
    fn test_validation_duplicate_outputs() {
        let result = PipelineConfig::builder()
            .transformed_train_file_path("out/data.bin")
            .transformed_test_file_path("out/data.bin")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::DuplicateOutputPath { .. }
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "schema_path": "config/schema.yaml",
            "train_file_path": "data/train.csv",
            "test_file_path": "data/test.csv",
            "artifact_dir": "artifact",
            "validation_report_file_path": "artifact/report.json",
            "transformed_object_file_path": "artifact/pre.bin",
            "transformed_train_file_path": "artifact/train.bin",
            "transformed_test_file_path": "artifact/test.bin",
            "target_column": "Personality",
            "column_check_mode": "Strict",
            "outlier_strategy": "Keep",
            "numeric_imputation": "Mean",
            "categorical_imputation": "Constant",
            "handle_unknown": "Error",
            "balance_classes": false,
            "smote_k_neighbors": 3,
            "random_state": 1
        }"#;

        let config: PipelineConfig = serde_json::from_str(json).expect("Should deserialize");

        assert_eq!(config.column_check_mode, ColumnCheckMode::Strict);
        assert_eq!(config.numeric_imputation, NumericImputation::Mean);
        assert_eq!(config.categorical_imputation, CategoricalImputation::Constant);
        assert_eq!(config.handle_unknown, HandleUnknown::Error);
        assert_eq!(config.train_file_path, PathBuf::from("data/train.csv"));
        assert!(config.validate().is_ok());
    }
}
