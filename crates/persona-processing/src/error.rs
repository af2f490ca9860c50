//! Custom error types for the validation and transformation stages.
//!
//! Every fault raised by this crate is a [`PreprocessingError`]. Semantic
//! validation failures (missing columns, column count mismatch) are not
//! errors; they are carried by [`ValidationReport`](crate::types::ValidationReport).
//!
//! Errors serialize as `{code, message}` so a caller can log or forward them
//! without matching on the variant.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the preprocessing stages.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Schema file is malformed or lacks required keys.
    #[error("Invalid schema: {0}")]
    Schema(String),

    /// No valid values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// A target label seen at transform time was never seen during fitting.
    #[error("Unseen label '{label}' (known labels: {known:?})")]
    UnseenLabel { label: String, known: Vec<String> },

    /// A target label is null.
    #[error("Missing target label at row {row}")]
    MissingLabel { row: usize },

    /// A category seen at transform time was never seen during fitting.
    #[error("Unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    /// Input shape does not match what the fitted transformer expects.
    #[error("Feature mismatch: expected {expected}, got {actual}")]
    FeatureMismatch { expected: String, actual: String },

    /// A numerical column holds a value that does not parse as a number.
    #[error("Non-numeric value '{value}' in numerical column '{column}' at row {row}")]
    InvalidNumeric {
        column: String,
        row: usize,
        value: String,
    },

    /// Dataset had no rows to work with.
    #[error("Dataset '{0}' is empty")]
    EmptyData(String),

    /// Oversampling could not be performed.
    #[error("Resampling failed: {0}")]
    Resampling(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Binary artifact (de)serialization error.
    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PreprocessingError>,
    },
}

impl PreprocessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PreprocessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable code for this error.
    ///
    /// Context wrappers report the code of the error they wrap.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Schema(_) => "SCHEMA_ERROR",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::UnseenLabel { .. } => "UNSEEN_LABEL",
            Self::MissingLabel { .. } => "MISSING_LABEL",
            Self::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            Self::FeatureMismatch { .. } => "FEATURE_MISMATCH",
            Self::InvalidNumeric { .. } => "INVALID_NUMERIC",
            Self::EmptyData(_) => "EMPTY_DATA",
            Self::Resampling(_) => "RESAMPLING_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Yaml(_) => "YAML_ERROR",
            Self::Bincode(_) => "BINCODE_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// The innermost error, with every context layer peeled off.
    pub fn root(&self) -> &PreprocessingError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this error stems from the input data or configuration rather
    /// than from the environment (I/O, library faults).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.root(),
            Self::InvalidConfig(_)
                | Self::Schema(_)
                | Self::UnseenLabel { .. }
                | Self::MissingLabel { .. }
                | Self::UnknownCategory { .. }
                | Self::FeatureMismatch { .. }
                | Self::InvalidNumeric { .. }
        )
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for preprocessing operations.
pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Io(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            PreprocessingError::ColumnNotFound("test".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            PreprocessingError::UnseenLabel {
                label: "Ambivert".to_string(),
                known: vec!["Extrovert".to_string()],
            }
            .error_code(),
            "UNSEEN_LABEL"
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(PreprocessingError::Schema("missing key".to_string()).is_recoverable());
        assert!(
            PreprocessingError::InvalidConfig("bad".to_string())
                .with_context("During setup")
                .is_recoverable()
        );
        assert!(!PreprocessingError::Internal("boom".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let error = PreprocessingError::ColumnNotFound("Stage_fear".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Stage_fear"));
    }

    #[test]
    fn test_with_context() {
        let error = PreprocessingError::ColumnNotFound("test".to_string())
            .with_context("During transformation");
        assert!(error.to_string().contains("During transformation"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND"); // Preserves original code
        assert!(matches!(error.root(), PreprocessingError::ColumnNotFound(_)));
    }

    #[test]
    fn test_io_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        let error = result.context("Reading schema").unwrap_err();
        assert_eq!(error.error_code(), "IO_ERROR");
        assert!(error.to_string().starts_with("Reading schema"));
    }
}
