//! Feature transformation stage.
//!
//! Fits the preprocessing pipeline on the training split, applies it to
//! the test split, encodes the target, oversamples the training split and
//! persists the fitted transformer alongside both matrices.

mod outliers;
mod transformer;

pub use outliers::{IQR_MULTIPLIER, OutlierHandler};
pub use transformer::DataTransformer;
