//! Fit/transform building blocks for the feature matrix.
//!
//! Fitting and transforming are split across two traits:
//! - [`Transformer`]: unfitted, holds hyperparameters, learns from a frame.
//! - [`FittedTransformer`]: holds learned state, maps frames to matrices.
//!
//! `transform` takes `&self`, so applying a fitted transformer to test or
//! inference data cannot change what was learned from training data.
//!
//! # Example
//!
//! ```rust,ignore
//! use persona_processing::preprocessing::*;
//!
//! let pipeline = ColumnTransformer::new(vec![
//!     ("num".to_string(), Branch::Numeric(NumericPipeline::new(num_cols))),
//!     ("cat".to_string(), Branch::Categorical(CategoricalPipeline::new(cat_cols))),
//! ])?;
//!
//! let (fitted, train_matrix) = pipeline.fit_transform(&train_features)?;
//! let test_matrix = fitted.transform(&test_features)?;
//! ```

mod categorical;
mod column_transformer;
mod label;
mod numeric;

pub use categorical::{CategoricalColumnState, CategoricalPipeline, FittedCategoricalPipeline};
pub use column_transformer::{Branch, ColumnTransformer, FittedBranch, FittedColumnTransformer};
pub use label::{FittedLabelEncoder, LabelEncoder};
pub use numeric::{FittedNumericPipeline, NumericColumnState, NumericPipeline};

use crate::error::Result;
use ndarray::Array2;
use polars::prelude::DataFrame;

/// An unfitted transformer.
pub trait Transformer {
    /// The state produced by fitting.
    type Fitted: FittedTransformer;

    /// Learn parameters from `data`.
    fn fit(&self, data: &DataFrame) -> Result<Self::Fitted>;

    /// Fit on `data` and transform the same frame.
    fn fit_transform(&self, data: &DataFrame) -> Result<(Self::Fitted, Array2<f64>)> {
        let fitted = self.fit(data)?;
        let transformed = fitted.transform(data)?;
        Ok((fitted, transformed))
    }
}

/// A fitted transformer, read-only after fitting.
pub trait FittedTransformer {
    /// Map `data` to a dense matrix with one row per input row.
    fn transform(&self, data: &DataFrame) -> Result<Array2<f64>>;

    /// Columns this transformer reads.
    fn input_columns(&self) -> Vec<String>;

    /// Names of the produced matrix columns, in order.
    fn feature_names_out(&self) -> Vec<String>;

    fn n_features_out(&self) -> usize {
        self.feature_names_out().len()
    }
}
