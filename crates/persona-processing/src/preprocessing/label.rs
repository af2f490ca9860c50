//! Target label encoding.
//!
//! Classes are sorted, so the integer for a label only depends on the set of
//! training labels, never on their order of appearance.

use crate::error::{PreprocessingError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Unfitted label encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelEncoder;

impl LabelEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Learn the class vocabulary from training labels.
    pub fn fit(&self, labels: &[Option<String>]) -> Result<FittedLabelEncoder> {
        let mut classes = BTreeSet::new();
        for (row, label) in labels.iter().enumerate() {
            let label = label
                .as_deref()
                .ok_or(PreprocessingError::MissingLabel { row })?;
            classes.insert(label.to_string());
        }
        if classes.is_empty() {
            return Err(PreprocessingError::EmptyData("target labels".to_string()));
        }
        Ok(FittedLabelEncoder {
            classes: classes.into_iter().collect(),
        })
    }

    pub fn fit_transform(
        &self,
        labels: &[Option<String>],
    ) -> Result<(FittedLabelEncoder, Array1<i64>)> {
        let fitted = self.fit(labels)?;
        let encoded = fitted.transform(labels)?;
        Ok((fitted, encoded))
    }
}

/// Fitted label encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedLabelEncoder {
    classes: Vec<String>,
}

impl FittedLabelEncoder {
    /// Sorted class labels; a label's index is its code.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Label to code.
    pub fn mapping(&self) -> BTreeMap<String, i64> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i as i64))
            .collect()
    }

    pub fn encode(&self, label: &str) -> Result<i64> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map(|i| i as i64)
            .map_err(|_| PreprocessingError::UnseenLabel {
                label: label.to_string(),
                known: self.classes.clone(),
            })
    }

    /// Strictly encode labels; any label outside the training classes fails.
    pub fn transform(&self, labels: &[Option<String>]) -> Result<Array1<i64>> {
        labels
            .iter()
            .enumerate()
            .map(|(row, label)| {
                let label = label
                    .as_deref()
                    .ok_or(PreprocessingError::MissingLabel { row })?;
                self.encode(label)
            })
            .collect::<Result<Vec<i64>>>()
            .map(Array1::from)
    }

    /// Map codes back to labels.
    pub fn inverse_transform(&self, codes: &[i64]) -> Result<Vec<String>> {
        codes
            .iter()
            .map(|&code| {
                usize::try_from(code)
                    .ok()
                    .and_then(|i| self.classes.get(i))
                    .cloned()
                    .ok_or_else(|| PreprocessingError::UnseenLabel {
                        label: code.to_string(),
                        known: self.classes.clone(),
                    })
            })
            .collect()
    }
}
