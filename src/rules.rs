//! Per-dataset analysis configuration.
//!
//! A [`RuleBook`] maps dataset names to the keys and rules to check on them. Datasets without an
//! entry are still profiled and take part in relationship inference.
//!
//! ```rust
//! use dataset_integrity::rules::RuleBook;
//!
//! let book = RuleBook::from_json_str(r#"{
//!     "datasets": {
//!         "sku_warehouse_map": {
//!             "key_columns": ["Entity"],
//!             "structural_keys": [
//!                 {"first": "SKU_ID", "second": "Warehouse_ID", "identifier": "Entity"}
//!             ]
//!         },
//!         "residuals": {
//!             "consistency": [
//!                 {"name": "abs", "relation": "absolute_value",
//!                  "source": "error", "derived": "absolute_error"}
//!             ],
//!             "grouped_statistics": [
//!                 {"group_by": ["Horizon"], "columns": ["error", "absolute_error"]}
//!             ]
//!         }
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(book.rules_for("sku_warehouse_map").structural_keys.len(), 1);
//! assert!(book.rules_for("unknown").is_empty());
//! ```

use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::consistency::ConsistencyRule;
use crate::error::RulesResult;
use crate::profile::GroupedStatisticsSpec;
use crate::structure::StructuralKeySpec;

/// An ordered column pair checked as a composite key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeKeySpec {
    pub first: String,
    pub second: String,
}

impl CompositeKeySpec {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }
}

/// Everything designated for one dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetRules {
    /// Columns classified as single-column key candidates, in addition to auto-detected ones.
    pub key_columns: Vec<String>,
    pub composite_keys: Vec<CompositeKeySpec>,
    pub structural_keys: Vec<StructuralKeySpec>,
    pub consistency: Vec<ConsistencyRule>,
    pub grouped_statistics: Vec<GroupedStatisticsSpec>,
}

impl DatasetRules {
    pub fn is_empty(&self) -> bool {
        self.key_columns.is_empty()
            && self.composite_keys.is_empty()
            && self.structural_keys.is_empty()
            && self.consistency.is_empty()
            && self.grouped_statistics.is_empty()
    }

    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_columns.push(column.into());
        self
    }

    pub fn with_composite_key(mut self, key: CompositeKeySpec) -> Self {
        self.composite_keys.push(key);
        self
    }

    pub fn with_structural_key(mut self, key: StructuralKeySpec) -> Self {
        self.structural_keys.push(key);
        self
    }

    pub fn with_rule(mut self, rule: ConsistencyRule) -> Self {
        self.consistency.push(rule);
        self
    }

    pub fn with_grouped_statistics(mut self, spec: GroupedStatisticsSpec) -> Self {
        self.grouped_statistics.push(spec);
        self
    }
}

static NO_RULES: LazyLock<DatasetRules> = LazyLock::new(DatasetRules::default);

/// Rules for a whole collection, keyed by dataset name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleBook {
    #[serde(default)]
    pub datasets: IndexMap<String, DatasetRules>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dataset: impl Into<String>, rules: DatasetRules) -> Self {
        self.datasets.insert(dataset.into(), rules);
        self
    }

    pub fn from_json_str(json: &str) -> RulesResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> RulesResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Rules for `dataset`, or an empty set.
    pub fn rules_for(&self, dataset: &str) -> &DatasetRules {
        self.datasets.get(dataset).unwrap_or(&*NO_RULES)
    }
}

#[cfg(test)]
mod tests {
    use super::{CompositeKeySpec, DatasetRules, RuleBook};
    use crate::consistency::ConsistencyRule;
    use crate::profile::GroupedStatisticsSpec;
    use crate::error::RulesError;

    #[test]
    fn missing_sections_default_to_empty() {
        let book = RuleBook::from_json_str(r#"{"datasets": {"x": {"key_columns": ["id"]}}}"#)
            .unwrap();
        let rules = book.rules_for("x");
        assert_eq!(rules.key_columns, vec!["id"]);
        assert!(rules.composite_keys.is_empty());
        assert!(rules.consistency.is_empty());
    }

    #[test]
    fn dataset_order_is_preserved() {
        let book = RuleBook::from_json_str(r#"{"datasets": {"z": {}, "a": {}, "m": {}}}"#).unwrap();
        let names: Vec<&str> = book.datasets.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn builder_matches_json() {
        let built = RuleBook::new().with(
            "residuals",
            DatasetRules::default()
                .with_composite_key(CompositeKeySpec::new("Entity", "Horizon"))
                .with_rule(ConsistencyRule::non_negative("nn", "absolute_error"))
                .with_grouped_statistics(GroupedStatisticsSpec::new(["Horizon"], ["error"])),
        );
        let parsed = RuleBook::from_json_str(
            r#"{"datasets": {"residuals": {
                "composite_keys": [{"first": "Entity", "second": "Horizon"}],
                "consistency": [{"name": "nn", "relation": "non_negative", "column": "absolute_error"}],
                "grouped_statistics": [{"group_by": ["Horizon"], "columns": ["error"]}]
            }}}"#,
        )
        .unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn unknown_relation_is_rejected() {
        let err = RuleBook::from_json_str(
            r#"{"datasets": {"x": {"consistency": [{"name": "r", "relation": "is_prime", "column": "a"}]}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RulesError::Json(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = RuleBook::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, RulesError::Io(_)));
    }
}
