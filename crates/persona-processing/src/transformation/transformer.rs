//! Data transformer implementation.

use super::OutlierHandler;
use crate::balancing::{ResampleResult, Smote, class_counts};
use crate::config::{OutlierStrategy, PipelineConfig};
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::preprocessing::{
    Branch, CategoricalPipeline, ColumnTransformer, FittedColumnTransformer, FittedLabelEncoder,
    FittedTransformer, LabelEncoder, NumericPipeline, Transformer,
};
use crate::schema::SchemaConfig;
use crate::types::{DataTransformationArtifact, OutlierBounds, TransformationSummary};
use crate::utils::{read_dataset, save_array, string_values};
use ndarray::{Array1, Array2, Axis, concatenate};
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fits and applies the feature pipeline for one run.
#[derive(Debug, Clone)]
pub struct DataTransformer {
    config: PipelineConfig,
    schema: SchemaConfig,
}

static_assertions::assert_impl_all!(DataTransformer: Send);

impl DataTransformer {
    pub fn new(config: PipelineConfig, schema: SchemaConfig) -> Self {
        Self { config, schema }
    }

    /// Build a transformer, loading the schema from `config.schema_path`.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let schema = SchemaConfig::from_file(&config.schema_path)?;
        Ok(Self::new(config, schema))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Numerical and categorical feature columns, target excluded.
    pub fn load_schema(&self) -> (Vec<String>, Vec<String>) {
        let (numerical, categorical) = self.schema.feature_columns(&self.config.target_column);
        info!("Numerical features: {:?}", numerical);
        info!("Categorical features: {:?}", categorical);
        (numerical, categorical)
    }

    /// IQR-clip `numerical_cols` in a copy of `df`.
    pub fn clip_outliers(
        &self,
        df: &DataFrame,
        numerical_cols: &[String],
    ) -> Result<(DataFrame, Vec<OutlierBounds>)> {
        OutlierHandler::clip_outliers(df, numerical_cols)
    }

    /// Two-branch column transformer: `num` then `cat`.
    pub fn build_pipeline(
        &self,
        numerical_cols: &[String],
        categorical_cols: &[String],
    ) -> Result<ColumnTransformer> {
        let num = NumericPipeline::new(numerical_cols.to_vec())
            .with_imputation(self.config.numeric_imputation);
        let cat = CategoricalPipeline::new(categorical_cols.to_vec())
            .with_imputation(self.config.categorical_imputation)
            .with_handle_unknown(self.config.handle_unknown);

        ColumnTransformer::new(vec![
            ("num".to_string(), Branch::Numeric(num)),
            ("cat".to_string(), Branch::Categorical(cat)),
        ])
    }

    /// Fit on the training features and transform them.
    pub fn fit_transform_train(
        &self,
        pipeline: &ColumnTransformer,
        train_features: &DataFrame,
    ) -> Result<(FittedColumnTransformer, Array2<f64>)> {
        pipeline
            .fit_transform(train_features)
            .context("Fitting preprocessing pipeline on training features")
    }

    /// Apply an already fitted pipeline to the test features.
    pub fn transform_test(
        &self,
        fitted: &FittedColumnTransformer,
        test_features: &DataFrame,
    ) -> Result<Array2<f64>> {
        fitted
            .transform(test_features)
            .context("Transforming test features")
    }

    /// Fit a label encoder on training labels and apply it to both splits.
    ///
    /// Fails on any test label the training split never contained.
    pub fn encode_target(
        &self,
        train_labels: &[Option<String>],
        test_labels: &[Option<String>],
    ) -> Result<(Array1<i64>, Array1<i64>, FittedLabelEncoder)> {
        let (encoder, train) = LabelEncoder::new()
            .fit_transform(train_labels)
            .context("Encoding training target")?;
        let test = encoder
            .transform(test_labels)
            .context("Encoding test target")?;
        info!("Encoded target with mapping {:?}", encoder.mapping());
        Ok((train, test, encoder))
    }

    /// Oversample the training pair with SMOTE.
    pub fn balance_training_set(
        &self,
        features: &Array2<f64>,
        labels: &Array1<i64>,
    ) -> Result<ResampleResult> {
        info!("Applying SMOTE to training data");
        Smote::new()
            .with_k_neighbors(self.config.smote_k_neighbors)
            .with_seed(self.config.random_state)
            .fit_resample(features, labels)
            .context("Balancing training set")
    }

    /// Separate the target from the feature columns.
    fn split_target(&self, df: &DataFrame) -> Result<(DataFrame, Vec<Option<String>>)> {
        let target = self.config.target_column.as_str();
        let labels = string_values(df, target)?;
        let features = df
            .drop(target)
            .context(format!("Dropping target column '{}'", target))?;
        Ok((features, labels))
    }

    /// Run the whole stage and persist its outputs.
    pub fn run(&self) -> Result<DataTransformationArtifact> {
        let start = Instant::now();
        let mut summary = TransformationSummary::default();
        info!("Starting data transformation");

        let (numerical, categorical) = self.load_schema();

        let train_df = read_dataset(&self.config.train_file_path).context("Reading training split")?;
        let test_df = read_dataset(&self.config.test_file_path).context("Reading test split")?;
        info!("Train dataframe shape: {:?}", train_df.shape());
        info!("Test dataframe shape: {:?}", test_df.shape());
        summary.train_rows = train_df.height();
        summary.test_rows = test_df.height();

        let (train_features, train_labels) = self.split_target(&train_df)?;
        let (test_features, test_labels) = self.split_target(&test_df)?;

        let train_features = match self.config.outlier_strategy {
            OutlierStrategy::Clip => {
                let (clipped, bounds) = self.clip_outliers(&train_features, &numerical)?;
                summary.outliers = bounds;
                clipped
            }
            OutlierStrategy::Keep => {
                debug!("Outlier clipping disabled");
                train_features
            }
        };

        let pipeline = self.build_pipeline(&numerical, &categorical)?;
        let (fitted, train_matrix) = self.fit_transform_train(&pipeline, &train_features)?;
        let test_matrix = self.transform_test(&fitted, &test_features)?;
        summary.n_features_out = fitted.n_features_out();
        summary.feature_names = fitted.feature_names_out();

        let (train_target, test_target, encoder) =
            self.encode_target(&train_labels, &test_labels)?;
        summary.class_counts_before = labelled_counts(&encoder, &train_target)?;

        let (train_matrix, train_target) = if self.config.balance_classes {
            let resampled = self.balance_training_set(&train_matrix, &train_target)?;
            summary.synthetic_rows = resampled.total_synthetic();
            (resampled.x, resampled.y)
        } else {
            summary.add_warning("Class balancing disabled; training split left as is");
            (train_matrix, train_target)
        };
        summary.train_rows_balanced = train_matrix.nrows();
        summary.class_counts_after = labelled_counts(&encoder, &train_target)?;

        let train_arr = append_target(&train_matrix, &train_target)?;
        let test_arr = append_target(&test_matrix, &test_target)?;
        debug!("Feature/target concatenation done for train and test");

        fitted.save(&self.config.transformed_object_file_path)?;
        save_array(&self.config.transformed_train_file_path, &train_arr)
            .context("Saving transformed training array")?;
        save_array(&self.config.transformed_test_file_path, &test_arr)
            .context("Saving transformed test array")?;
        info!("Saved transformation object and transformed arrays");

        if summary.total_clipped() > 0 {
            summary.add_warning(format!(
                "{} training value(s) clipped to IQR fences",
                summary.total_clipped()
            ));
        }
        summary.duration_ms = start.elapsed().as_millis() as u64;
        summary.generated_at = chrono::Utc::now().to_rfc3339();

        if let Some(ratio) = summary.imbalance_ratio_after()
            && ratio > 1.0
        {
            warn!("Training split still imbalanced after resampling (ratio {:.2})", ratio);
        }
        info!(
            "Data transformation completed in {}ms: train {:?}, test {:?}",
            summary.duration_ms,
            train_arr.dim(),
            test_arr.dim()
        );

        Ok(DataTransformationArtifact {
            transformed_object_file_path: self.config.transformed_object_file_path.clone(),
            transformed_train_file_path: self.config.transformed_train_file_path.clone(),
            transformed_test_file_path: self.config.transformed_test_file_path.clone(),
            summary,
        })
    }
}

/// Class counts keyed by label text instead of code.
fn labelled_counts(
    encoder: &FittedLabelEncoder,
    target: &Array1<i64>,
) -> Result<BTreeMap<String, usize>> {
    class_counts(target)
        .into_iter()
        .map(|(code, count)| {
            let label = encoder
                .inverse_transform(&[code])?
                .into_iter()
                .next()
                .ok_or_else(|| PreprocessingError::Internal(format!("no label for {}", code)))?;
            Ok((label, count))
        })
        .collect()
}

/// Append the target as a trailing column.
fn append_target(features: &Array2<f64>, target: &Array1<i64>) -> Result<Array2<f64>> {
    if features.nrows() != target.len() {
        return Err(PreprocessingError::FeatureMismatch {
            expected: format!("{} target values", features.nrows()),
            actual: format!("{} target values", target.len()),
        });
    }
    let target = target.mapv(|v| v as f64).insert_axis(Axis(1));
    concatenate(Axis(1), &[features.view(), target.view()])
        .map_err(|e| PreprocessingError::Internal(format!("appending target column: {}", e)))
}
