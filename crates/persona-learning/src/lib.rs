//! persona-learning: inference on top of the preprocessing artifacts.
//!
//! The transformation stage persists a fitted
//! [`FittedColumnTransformer`](persona_processing::FittedColumnTransformer).
//! This crate pairs it with any trained model implementing [`Classifier`]
//! and maps predicted codes back to personality classes.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use persona_learning::{Classifier, PersonalityModel, Result};
//! use ndarray::{Array1, ArrayView2};
//!
//! struct MyModel { /* trained weights */ }
//!
//! impl Classifier for MyModel {
//!     fn predict(&self, features: ArrayView2<f64>) -> Result<Array1<i64>> {
//!         // ...
//!     }
//! }
//!
//! let model = PersonalityModel::load(artifact.transformed_object_file_path, MyModel { .. })?;
//! let labels = model.predict_labels(&new_rows)?; // ["extrovert", "introvert", ...]
//! ```

pub mod error;
pub mod mapping;
pub mod model;

pub use error::{LearningError, Result};
pub use mapping::TargetValueMapping;
pub use model::{Classifier, PersonalityModel};
