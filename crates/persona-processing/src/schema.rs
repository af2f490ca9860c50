//! Dataset schema loaded from a YAML descriptor.
//!
//! ```yaml
//! columns:
//!   - Time_spent_Alone: float
//!   - Stage_fear: category
//!   - Personality: category
//! numerical_columns: [Time_spent_Alone]
//! categorical_columns: [Stage_fear, Personality]
//! num_features: [Time_spent_Alone]
//! cat_features: [Stage_fear, Personality]
//! ```
//!
//! The validator reads `numerical_columns`/`categorical_columns`, the
//! transformer reads `num_features`/`cat_features`. When only one of the two
//! spellings is present it stands in for the other.

use crate::error::{PreprocessingError, Result, ResultExt};
use crate::utils::read_yaml_file;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

/// A declared column and its type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub dtype: String,
}

/// Validated schema descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Every expected column, in declaration order.
    pub columns: Vec<ColumnSpec>,
    /// Numerical columns the validator requires.
    pub numerical_columns: Vec<String>,
    /// Categorical columns the validator requires.
    pub categorical_columns: Vec<String>,
    /// Numerical features fed to the transformer.
    pub num_features: Vec<String>,
    /// Categorical features fed to the transformer. May include the target.
    pub cat_features: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColumnsDecl {
    List(Vec<BTreeMap<String, serde_yaml::Value>>),
    Map(serde_yaml::Mapping),
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    columns: Option<ColumnsDecl>,
    numerical_columns: Option<Vec<String>>,
    categorical_columns: Option<Vec<String>>,
    num_features: Option<Vec<String>>,
    cat_features: Option<Vec<String>>,
}

fn dtype_tag(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Null => "unknown".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "unknown".to_string()),
    }
}

impl ColumnsDecl {
    fn into_specs(self) -> Result<Vec<ColumnSpec>> {
        match self {
            ColumnsDecl::List(entries) => entries
                .into_iter()
                .map(|entry| {
                    let mut iter = entry.into_iter();
                    match (iter.next(), iter.next()) {
                        (Some((name, dtype)), None) => Ok(ColumnSpec {
                            dtype: dtype_tag(&dtype),
                            name,
                        }),
                        _ => Err(PreprocessingError::Schema(
                            "each 'columns' entry must map exactly one name to a type".to_string(),
                        )),
                    }
                })
                .collect(),
            ColumnsDecl::Map(map) => map
                .into_iter()
                .map(|(name, dtype)| match name {
                    serde_yaml::Value::String(name) => Ok(ColumnSpec {
                        name,
                        dtype: dtype_tag(&dtype),
                    }),
                    other => Err(PreprocessingError::Schema(format!(
                        "column names must be strings, got {:?}",
                        other
                    ))),
                })
                .collect(),
        }
    }
}

fn ensure_disjoint(numerical: &[String], categorical: &[String], keys: &str) -> Result<()> {
    let numerical: HashSet<&str> = numerical.iter().map(String::as_str).collect();
    let mut overlap: Vec<&str> = categorical
        .iter()
        .map(String::as_str)
        .filter(|c| numerical.contains(c))
        .collect();
    if overlap.is_empty() {
        return Ok(());
    }
    overlap.sort_unstable();
    overlap.dedup();
    Err(PreprocessingError::Schema(format!(
        "{} overlap on {:?}",
        keys, overlap
    )))
}

impl SchemaConfig {
    /// Parse a schema from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let raw: RawSchema = serde_yaml::from_str(yaml)?;
        Self::from_raw(raw)
    }

    /// Read and parse a schema file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw: RawSchema = read_yaml_file(path)
            .context(format!("Failed to load schema file {}", path.display()))?;
        Self::from_raw(raw).context(format!("Invalid schema {}", path.display()))
    }

    fn from_raw(raw: RawSchema) -> Result<Self> {
        let columns = raw
            .columns
            .ok_or_else(|| PreprocessingError::Schema("missing required key 'columns'".to_string()))?
            .into_specs()?;

        let numerical_columns = raw
            .numerical_columns
            .clone()
            .or_else(|| raw.num_features.clone())
            .ok_or_else(|| {
                PreprocessingError::Schema(
                    "missing 'numerical_columns' (or 'num_features')".to_string(),
                )
            })?;
        let categorical_columns = raw
            .categorical_columns
            .clone()
            .or_else(|| raw.cat_features.clone())
            .ok_or_else(|| {
                PreprocessingError::Schema(
                    "missing 'categorical_columns' (or 'cat_features')".to_string(),
                )
            })?;
        let num_features = raw
            .num_features
            .unwrap_or_else(|| numerical_columns.clone());
        let cat_features = raw
            .cat_features
            .unwrap_or_else(|| categorical_columns.clone());

        ensure_disjoint(
            &numerical_columns,
            &categorical_columns,
            "numerical_columns and categorical_columns",
        )?;
        ensure_disjoint(&num_features, &cat_features, "num_features and cat_features")?;

        debug!(
            "Schema loaded: {} columns, {} numerical, {} categorical",
            columns.len(),
            num_features.len(),
            cat_features.len()
        );

        Ok(Self {
            columns,
            numerical_columns,
            categorical_columns,
            num_features,
            cat_features,
        })
    }

    /// Number of columns a conforming dataset must have.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Declared column names, in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Transformer feature lists with `target` removed from both.
    pub fn feature_columns(&self, target: &str) -> (Vec<String>, Vec<String>) {
        let numerical = self
            .num_features
            .iter()
            .filter(|c| c.as_str() != target)
            .cloned()
            .collect();
        let categorical = self
            .cat_features
            .iter()
            .filter(|c| c.as_str() != target)
            .cloned()
            .collect();
        (numerical, categorical)
    }
}
