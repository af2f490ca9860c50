//! Personality Dataset Preprocessing Library
//!
//! Validation and feature transformation stages for the personality
//! classification dataset, built with Rust and Polars.
//!
//! # Overview
//!
//! - **Schema Validation**: column count and required-column checks against
//!   a YAML schema, recorded in a JSON report
//! - **Outlier Clipping**: IQR fences on the training split
//! - **Feature Pipeline**: median/mode imputation, standard scaling and
//!   one-hot encoding, fitted on training data only
//! - **Target Encoding**: strict label encoding fitted on training labels
//! - **Class Balancing**: seeded SMOTE on the training split
//! - **Persistence**: the fitted transformer and both matrices are saved
//!   with bincode for the training and inference stages
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use persona_processing::{PipelineConfig, StagePipeline};
//!
//! let config = PipelineConfig::builder()
//!     .schema_path("config/schema.yaml")
//!     .train_file_path("data/train.csv")
//!     .test_file_path("data/test.csv")
//!     .artifact_dir("artifact")
//!     .build()?;
//!
//! let outcome = StagePipeline::builder().config(config).build()?.run()?;
//!
//! match outcome.transformation {
//!     Some(artifact) => println!("Features: {}", artifact.summary.n_features_out),
//!     None => println!("Validation failed: {}", outcome.validation.message),
//! }
//! ```
//!
//! # Running stages individually
//!
//! ```rust,ignore
//! use persona_processing::{DataTransformer, DataValidator, SchemaConfig};
//!
//! let schema = SchemaConfig::from_file(&config.schema_path)?;
//! let validation = DataValidator::new(config.clone(), schema.clone()).validate_files()?;
//! if validation.validation_status {
//!     let artifact = DataTransformer::new(config, schema).run()?;
//! }
//! ```
//!
//! # Loading artifacts downstream
//!
//! ```rust,ignore
//! use persona_processing::{load_array, FittedColumnTransformer, FittedTransformer};
//!
//! let preprocessor = FittedColumnTransformer::load(&artifact.transformed_object_file_path)?;
//! let train = load_array(&artifact.transformed_train_file_path)?;
//! let features = preprocessor.transform(&new_rows)?;
//! ```

pub mod balancing;
pub mod config;
pub mod error;
pub mod imputers;
pub mod pipeline;
pub mod preprocessing;
pub mod schema;
pub mod transformation;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used types at the crate root
pub use balancing::{ResampleResult, Smote};
pub use config::{
    CategoricalImputation, ColumnCheckMode, ConfigValidationError, HandleUnknown,
    NumericImputation, OutlierStrategy, PipelineConfig, PipelineConfigBuilder, TARGET_COLUMN,
};
pub use error::{PreprocessingError, Result as PreprocessingResult, ResultExt};
pub use imputers::StatisticalImputer;
pub use pipeline::{StagePipeline, StagePipelineBuilder};
pub use preprocessing::{
    Branch, CategoricalPipeline, ColumnTransformer, FittedColumnTransformer, FittedLabelEncoder,
    FittedTransformer, LabelEncoder, NumericPipeline, Transformer,
};
pub use schema::{ColumnSpec, SchemaConfig};
pub use transformation::{DataTransformer, OutlierHandler};
pub use types::{
    DataTransformationArtifact, DataValidationArtifact, OutlierBounds, PipelineOutcome,
    TransformationSummary, ValidationReport,
};
pub use utils::{load_array, load_object, read_dataset, save_array, save_object};
pub use validation::{ColumnPresence, DataValidator};
