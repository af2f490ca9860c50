//! Schema validation stage.
//!
//! Checks ingested train/test frames against the schema and records the
//! outcome in a [`ValidationReport`](crate::types::ValidationReport).
//! Semantic failures never surface as `Err`.

mod validator;

pub use validator::{ColumnPresence, DataValidator};
