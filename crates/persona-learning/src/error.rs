//! Error types for the persona-learning crate.
//!
//! [`LearningError`] wraps preprocessing faults and adds the ways a
//! prediction itself can go wrong.

use persona_processing::PreprocessingError;
use thiserror::Error;

/// The main error type for inference.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LearningError {
    /// The fitted preprocessor failed to load or transform the input.
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),

    /// The classifier failed to produce predictions.
    #[error("Prediction failed: {0}")]
    Prediction(String),

    /// The classifier returned a different number of predictions than rows.
    #[error("Classifier returned {actual} predictions for {expected} rows")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A predicted class code has no label in the target mapping.
    #[error("Unknown class code {0}")]
    UnknownClass(i64),

    /// Error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<LearningError>,
    },
}

impl LearningError {
    pub fn with_context(self, context: impl Into<String>) -> Self {
        LearningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Preprocessing(e) => e.error_code(),
            Self::Prediction(_) => "PREDICTION_FAILED",
            Self::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            Self::UnknownClass(_) => "UNKNOWN_CLASS",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }
}

/// Result type alias for inference operations.
pub type Result<T> = std::result::Result<T, LearningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_pass_through() {
        let err = LearningError::from(PreprocessingError::FeatureMismatch {
            expected: "a".to_string(),
            actual: "b".to_string(),
        })
        .with_context("Transforming input");
        assert_eq!(err.error_code(), "FEATURE_MISMATCH");
        assert!(err.to_string().starts_with("Transforming input: "));

        let err = LearningError::ShapeMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.error_code(), "SHAPE_MISMATCH");
    }
}
