//! Imputation module for handling missing values.
//!
//! Statistical strategies only: median, mean or zero for numbers, mode or a
//! constant placeholder for categories.

mod statistical;

pub use statistical::{MISSING_CATEGORY, StatisticalImputer};
