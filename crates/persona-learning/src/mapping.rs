//! Integer codes of the personality classes.

use persona_processing::FittedLabelEncoder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Code assigned to each personality class.
///
/// Matches the sorted label encoding fitted during transformation:
/// `Extrovert` sorts before `Introvert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetValueMapping {
    pub extrovert: i64,
    pub introvert: i64,
}

static_assertions::assert_impl_all!(TargetValueMapping: Send, Sync);

impl Default for TargetValueMapping {
    fn default() -> Self {
        Self {
            extrovert: 0,
            introvert: 1,
        }
    }
}

impl TargetValueMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Class name to code.
    pub fn as_map(&self) -> BTreeMap<String, i64> {
        BTreeMap::from([
            ("extrovert".to_string(), self.extrovert),
            ("introvert".to_string(), self.introvert),
        ])
    }

    /// Code to class name.
    pub fn reverse_mapping(&self) -> BTreeMap<i64, String> {
        self.as_map().into_iter().map(|(k, v)| (v, k)).collect()
    }

    pub fn label(&self, code: i64) -> Option<&'static str> {
        if code == self.extrovert {
            Some("extrovert")
        } else if code == self.introvert {
            Some("introvert")
        } else {
            None
        }
    }

    /// Whether a fitted label encoder assigns the same codes, ignoring case.
    pub fn agrees_with(&self, encoder: &FittedLabelEncoder) -> bool {
        let expected = self.as_map();
        let fitted: BTreeMap<String, i64> = encoder
            .mapping()
            .into_iter()
            .map(|(label, code)| (label.to_lowercase(), code))
            .collect();
        fitted == expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_processing::LabelEncoder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reverse_mapping() {
        let mapping = TargetValueMapping::new();
        assert_eq!(
            mapping.reverse_mapping(),
            BTreeMap::from([(0, "extrovert".to_string()), (1, "introvert".to_string())])
        );
        assert_eq!(mapping.label(1), Some("introvert"));
        assert_eq!(mapping.label(7), None);
    }

    #[test]
    fn test_agrees_with_fitted_encoder() {
        let labels: Vec<Option<String>> = ["Introvert", "Extrovert"]
            .iter()
            .map(|s| Some(s.to_string()))
            .collect();
        let encoder = LabelEncoder::new().fit(&labels).unwrap();
        assert!(TargetValueMapping::new().agrees_with(&encoder));

        let swapped = TargetValueMapping {
            extrovert: 1,
            introvert: 0,
        };
        assert!(!swapped.agrees_with(&encoder));
    }
}
