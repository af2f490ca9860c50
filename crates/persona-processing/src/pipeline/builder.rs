//! Stage orchestration.
//!
//! [`StagePipeline`] runs the validator and, only when validation passes,
//! the transformer.

use crate::config::PipelineConfig;
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::schema::SchemaConfig;
use crate::transformation::DataTransformer;
use crate::types::PipelineOutcome;
use crate::validation::DataValidator;
use tracing::{error, info, warn};

/// Validation followed by transformation.
///
/// Use [`StagePipeline::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use persona_processing::{PipelineConfig, StagePipeline};
///
/// let outcome = StagePipeline::builder()
///     .config(PipelineConfig::builder().artifact_dir("artifact/run_01").build()?)
///     .build()?
///     .run()?;
///
/// if outcome.succeeded() {
///     println!("{:?}", outcome.transformation);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct StagePipeline {
    validator: DataValidator,
    transformer: DataTransformer,
}

static_assertions::assert_impl_all!(StagePipeline: Send);

impl StagePipeline {
    pub fn builder() -> StagePipelineBuilder {
        StagePipelineBuilder::default()
    }

    pub fn validator(&self) -> &DataValidator {
        &self.validator
    }

    pub fn transformer(&self) -> &DataTransformer {
        &self.transformer
    }

    /// Run both stages.
    ///
    /// A failed validation is not an error: the outcome carries the report
    /// and no transformation artifact.
    pub fn run(&self) -> Result<PipelineOutcome> {
        match self.run_internal() {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn run_internal(&self) -> Result<PipelineOutcome> {
        let validation = self
            .validator
            .validate_files()
            .context("Data validation stage")?;

        if !validation.validation_status {
            warn!(
                "Skipping transformation, validation failed: {}",
                validation.message
            );
            return Ok(PipelineOutcome {
                validation,
                transformation: None,
            });
        }

        let transformation = self
            .transformer
            .run()
            .context("Data transformation stage")?;
        info!("Pipeline completed successfully");

        Ok(PipelineOutcome {
            validation,
            transformation: Some(transformation),
        })
    }
}

/// Builder for [`StagePipeline`].
#[derive(Debug, Default)]
pub struct StagePipelineBuilder {
    config: Option<PipelineConfig>,
    schema: Option<SchemaConfig>,
}

static_assertions::assert_impl_all!(StagePipelineBuilder: Send);

impl StagePipelineBuilder {
    /// Set the pipeline configuration. Defaults to [`PipelineConfig::default()`].
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an already loaded schema instead of reading `config.schema_path`.
    pub fn schema(mut self, schema: SchemaConfig) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Validate the configuration, load the schema if needed and build.
    pub fn build(self) -> Result<StagePipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| PreprocessingError::InvalidConfig(e.to_string()))?;

        let schema = match self.schema {
            Some(schema) => schema,
            None => SchemaConfig::from_file(&config.schema_path)?,
        };

        Ok(StagePipeline {
            validator: DataValidator::new(config.clone(), schema.clone()),
            transformer: DataTransformer::new(config, schema),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = PipelineConfig::default();
        config.smote_k_neighbors = 0;
        let err = StagePipeline::builder().config(config).build().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_build_fails_on_missing_schema_file() {
        let config = PipelineConfig::builder()
            .schema_path("does/not/exist.yaml")
            .build()
            .unwrap();
        let err = StagePipeline::builder().config(config).build().unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }

    #[test]
    fn test_build_with_explicit_schema() {
        let schema = SchemaConfig::from_yaml_str(
            "columns:\n  - A: float\nnumerical_columns: [A]\ncategorical_columns: []\n",
        )
        .unwrap();
        let pipeline = StagePipeline::builder().schema(schema).build().unwrap();
        assert_eq!(pipeline.validator().schema().column_count(), 1);
    }
}
