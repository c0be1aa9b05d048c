//! `dataset-integrity` profiles a collection of in-memory tabular datasets, infers relationships
//! between them by shared column names, and validates the structural and derived-value
//! invariants they are expected to satisfy.
//!
//! Analysis is read-only and one-shot: every report is a pure function of the dataset snapshot,
//! so re-running an unchanged collection reproduces identical reports.
//!
//! ## What gets checked
//!
//! - **Column profiles** ([`profile`]): null/distinct counts and percentages; min, max, mean,
//!   median and sample standard deviation for numeric columns; a first-seen sample of values for
//!   categorical columns; the date range of temporal columns; strongly correlated numeric pairs.
//! - **Key candidates** ([`keys`]): uniqueness and sequentiality (`1..=n`) of single columns,
//!   group cardinality of composite keys, and whether a pair of columns determines a third.
//! - **Relationships** ([`relationships`]): one edge per dataset pair sharing a column name.
//!   Identifier-like names are tagged with higher confidence; values are never joined.
//! - **Structure** ([`structure`]): cross-product completeness of two key domains, mapping
//!   cardinality, identifier uniqueness/sequentiality, duplicate rows and key combinations.
//! - **Consistency** ([`consistency`]): declarative rules such as "`absolute_error` equals
//!   `abs(error)`" or "`price` is non-negative".
//!
//! Data-quality findings are report content. Only a malformed configuration or an unreadable
//! dataset is an [`AnalysisError`], and it fails that dataset alone.
//!
//! ## Quick example
//!
//! ```rust
//! use dataset_integrity::engine::{AnalysisEngine, AnalysisOptions};
//! use dataset_integrity::rules::{DatasetRules, RuleBook};
//! use dataset_integrity::structure::StructuralKeySpec;
//! use dataset_integrity::types::{DataSet, DataSetCollection, DataType, Field, Schema, Value};
//!
//! # fn main() -> Result<(), dataset_integrity::AnalysisError> {
//! let schema = Schema::new(vec![
//!     Field::new("SKU_ID", DataType::Int64),
//!     Field::new("Warehouse_ID", DataType::Utf8),
//!     Field::new("Entity", DataType::Int64),
//! ]);
//! let mut rows = Vec::new();
//! for sku in 1..=4 {
//!     for wh in ["W1", "W2", "W3"] {
//!         let entity = rows.len() as i64 + 1;
//!         rows.push(vec![Value::Int64(sku), Value::Utf8(wh.into()), Value::Int64(entity)]);
//!     }
//! }
//! let collection = DataSetCollection::new().with("sku_map", DataSet::new(schema, rows));
//! let rules = RuleBook::new().with(
//!     "sku_map",
//!     DatasetRules::default()
//!         .with_structural_key(StructuralKeySpec::new("SKU_ID", "Warehouse_ID", "Entity")),
//! );
//!
//! let engine = AnalysisEngine::new(AnalysisOptions::default())?;
//! let report = engine.analyze_collection(&collection, &rules);
//! let sku_map = report.report("sku_map").unwrap();
//! assert!(sku_map.structural[0].cross_product.complete);
//! assert!(sku_map.is_clean());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: schema + in-memory dataset types
//! - [`typed`]: the type-checked, column-major view every analysis runs on
//! - [`profile`], [`keys`], [`relationships`], [`structure`], [`consistency`]: the analyses
//! - [`rules`]: per-dataset configuration (designated keys and rules)
//! - [`report`]: report structures
//! - [`engine`]: parallel execution over a collection, with metrics and observer hooks
//! - [`ingestion`]: a CSV loader for driving the engine from files
//! - [`error`]: error types

pub mod consistency;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod keys;
pub mod profile;
pub mod relationships;
pub mod report;
pub mod rules;
pub mod structure;
pub mod typed;
pub mod types;

pub use error::{
    AnalysisError, AnalysisResult, IngestionError, IngestionResult, RulesError, RulesResult,
};
pub use report::{AnalysisReport, CollectionReport, DatasetOutcome};
