//! Pipeline module.
//!
//! Orchestrates the validation and transformation stages.

mod builder;

pub use builder::{StagePipeline, StagePipelineBuilder};
