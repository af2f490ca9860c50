//! Categorical branch: impute, then one-hot encode.

use super::{FittedTransformer, Transformer};
use crate::config::{CategoricalImputation, HandleUnknown};
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::imputers::StatisticalImputer;
use crate::utils::string_values;
use ndarray::Array2;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Unfitted categorical pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalPipeline {
    columns: Vec<String>,
    imputation: CategoricalImputation,
    handle_unknown: HandleUnknown,
}

impl CategoricalPipeline {
    /// Mode imputation followed by one-hot encoding that ignores unseen
    /// categories.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            imputation: CategoricalImputation::Mode,
            handle_unknown: HandleUnknown::Ignore,
        }
    }

    pub fn with_imputation(mut self, imputation: CategoricalImputation) -> Self {
        self.imputation = imputation;
        self
    }

    pub fn with_handle_unknown(mut self, handle_unknown: HandleUnknown) -> Self {
        self.handle_unknown = handle_unknown;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// Learned state for one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumnState {
    pub column: String,
    pub fill_value: String,
    /// Sorted vocabulary; position is the one-hot slot.
    pub categories: Vec<String>,
}

impl CategoricalColumnState {
    fn slot(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }
}

/// Fitted categorical pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedCategoricalPipeline {
    pub states: Vec<CategoricalColumnState>,
    pub handle_unknown: HandleUnknown,
}

impl Transformer for CategoricalPipeline {
    type Fitted = FittedCategoricalPipeline;

    fn fit(&self, data: &DataFrame) -> Result<FittedCategoricalPipeline> {
        let mut states = Vec::with_capacity(self.columns.len());

        for column in &self.columns {
            let values = string_values(data, column)
                .context(format!("Fitting categorical column '{}'", column))?;
            let fill_value =
                StatisticalImputer::categorical_fill_value(column, &values, self.imputation)?;
            let filled = StatisticalImputer::fill_categorical(values, &fill_value);
            let categories: Vec<String> = filled
                .into_iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            debug!(
                "Categorical '{}': fill='{}', {} categories",
                column,
                fill_value,
                categories.len()
            );
            states.push(CategoricalColumnState {
                column: column.clone(),
                fill_value,
                categories,
            });
        }

        Ok(FittedCategoricalPipeline {
            states,
            handle_unknown: self.handle_unknown,
        })
    }
}

impl FittedTransformer for FittedCategoricalPipeline {
    fn transform(&self, data: &DataFrame) -> Result<Array2<f64>> {
        let mut out = Array2::zeros((data.height(), self.n_features_out()));
        let mut offset = 0;

        for state in &self.states {
            let values = string_values(data, &state.column)
                .context(format!("Transforming categorical column '{}'", state.column))?;
            let mut unknown = 0usize;

            for (i, value) in values.iter().enumerate() {
                let value = value.as_deref().unwrap_or(&state.fill_value);
                match state.slot(value) {
                    Some(slot) => out[[i, offset + slot]] = 1.0,
                    None => match self.handle_unknown {
                        HandleUnknown::Ignore => unknown += 1,
                        HandleUnknown::Error => {
                            return Err(PreprocessingError::UnknownCategory {
                                column: state.column.clone(),
                                value: value.to_string(),
                            });
                        }
                    },
                }
            }

            if unknown > 0 {
                warn!(
                    "{} unseen value(s) in '{}' encoded as all-zero rows",
                    unknown, state.column
                );
            }
            offset += state.categories.len();
        }

        Ok(out)
    }

    fn input_columns(&self) -> Vec<String> {
        self.states.iter().map(|s| s.column.clone()).collect()
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.states
            .iter()
            .flat_map(|s| {
                s.categories
                    .iter()
                    .map(move |c| format!("{}_{}", s.column, c))
            })
            .collect()
    }

    fn n_features_out(&self) -> usize {
        self.states.iter().map(|s| s.categories.len()).sum()
    }
}
