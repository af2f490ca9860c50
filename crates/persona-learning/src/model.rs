//! Inference wrapper pairing the fitted preprocessor with a classifier.
//!
//! [`PersonalityModel`] takes raw feature rows (the ingested column layout,
//! target excluded), runs them through the persisted
//! [`FittedColumnTransformer`] and hands the matrix to a [`Classifier`].
//! Nothing is refitted at inference time.
//!
//! # Example
//!
//! ```rust,ignore
//! use persona_learning::{Classifier, PersonalityModel};
//!
//! let model = PersonalityModel::load(
//!     "artifact/data_transformation/transformed_object/preprocessing.bin",
//!     my_classifier,
//! )?;
//!
//! println!("Using {}", model);
//! let labels = model.predict_labels(&new_rows)?;
//! ```

use crate::error::{LearningError, Result};
use crate::mapping::TargetValueMapping;
use ndarray::{Array1, ArrayView2};
use persona_processing::{FittedColumnTransformer, FittedTransformer};
use polars::prelude::DataFrame;
use std::fmt;
use std::path::Path;
use tracing::{debug, error, info};

/// A trained classifier over the transformed feature matrix.
pub trait Classifier {
    /// Predict one class code per row.
    fn predict(&self, features: ArrayView2<f64>) -> Result<Array1<i64>>;

    /// Type name shown in logs. Defaults to the unqualified Rust type name.
    fn name(&self) -> String {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base).to_string()
    }
}

/// Fitted preprocessor plus trained classifier.
#[derive(Debug, Clone)]
pub struct PersonalityModel<C: Classifier> {
    preprocessor: FittedColumnTransformer,
    classifier: C,
    mapping: TargetValueMapping,
}

impl<C: Classifier> PersonalityModel<C> {
    pub fn new(preprocessor: FittedColumnTransformer, classifier: C) -> Self {
        Self {
            preprocessor,
            classifier,
            mapping: TargetValueMapping::default(),
        }
    }

    /// Restore the preprocessor written by the transformation stage.
    pub fn load(preprocessor_path: impl AsRef<Path>, classifier: C) -> Result<Self> {
        let path = preprocessor_path.as_ref();
        let preprocessor = FittedColumnTransformer::load(path)
            .map_err(|e| LearningError::from(e).with_context("Loading preprocessor"))?;
        info!("Loaded preprocessor from {}", path.display());
        Ok(Self::new(preprocessor, classifier))
    }

    pub fn with_mapping(mut self, mapping: TargetValueMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn preprocessor(&self) -> &FittedColumnTransformer {
        &self.preprocessor
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Transform `df` and predict a class code per row.
    pub fn predict(&self, df: &DataFrame) -> Result<Array1<i64>> {
        self.predict_internal(df).inspect_err(|e| {
            error!("Error occurred in predict: {}", e);
        })
    }

    fn predict_internal(&self, df: &DataFrame) -> Result<Array1<i64>> {
        debug!("Starting prediction for {} rows", df.height());

        let features = self
            .preprocessor
            .transform(df)
            .map_err(|e| LearningError::from(e).with_context("Transforming input"))?;

        debug!("Using {} to get predictions", self.classifier.name());
        let predictions = self
            .classifier
            .predict(features.view())
            .map_err(|e| e.with_context(format!("{} prediction", self.classifier.name())))?;

        if predictions.len() != df.height() {
            return Err(LearningError::ShapeMismatch {
                expected: df.height(),
                actual: predictions.len(),
            });
        }
        Ok(predictions)
    }

    /// Predict and map codes back to class names.
    pub fn predict_labels(&self, df: &DataFrame) -> Result<Vec<String>> {
        self.predict(df)?
            .iter()
            .map(|&code| {
                self.mapping
                    .label(code)
                    .map(str::to_string)
                    .ok_or(LearningError::UnknownClass(code))
            })
            .collect()
    }
}

impl<C: Classifier> fmt::Display for PersonalityModel<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.classifier.name())
    }
}
