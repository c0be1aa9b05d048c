//! Core data model types.
//!
//! A [`DataSet`] is a row-major table of typed [`Value`]s shaped by a [`Schema`] (a list of typed
//! [`Field`]s). Datasets are grouped by name into a [`DataSetCollection`], which is the input of a
//! collection-wide analysis run.

use std::fmt;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Date and time without a time zone.
    Timestamp,
}

impl DataType {
    /// The analysis category a column of this type belongs to.
    pub fn kind(self) -> ColumnKind {
        match self {
            Self::Int64 | Self::Float64 => ColumnKind::Numeric,
            Self::Bool | Self::Utf8 => ColumnKind::Categorical,
            Self::Timestamp => ColumnKind::Temporal,
        }
    }
}

/// The three column categories the analysis distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Temporal,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A list of fields describing the shape of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Like [`Schema::index_of`], but reports a missing designated column as an error.
    pub fn require(&self, name: &str) -> AnalysisResult<usize> {
        self.index_of(name)
            .ok_or_else(|| AnalysisError::MissingDesignatedColumn {
                column: name.to_string(),
                available: self.field_names().map(str::to_string).collect(),
            })
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value. Never equal to zero or to the empty string.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Date and time without a time zone.
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The data type this value carries, or `None` for [`Value::Null`].
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Null => None,
            Self::Int64(_) => Some(DataType::Int64),
            Self::Float64(_) => Some(DataType::Float64),
            Self::Bool(_) => Some(DataType::Bool),
            Self::Utf8(_) => Some(DataType::Utf8),
            Self::Timestamp(_) => Some(DataType::Timestamp),
        }
    }

    /// Hashable identity of the value, or `None` for [`Value::Null`].
    pub fn key(&self) -> Option<ValueKey<'_>> {
        match self {
            Self::Null => None,
            Self::Int64(v) => Some(ValueKey::Int(*v)),
            Self::Float64(v) => Some(ValueKey::float(*v)),
            Self::Bool(v) => Some(ValueKey::Bool(*v)),
            Self::Utf8(s) => Some(ValueKey::Text(s.as_str())),
            Self::Timestamp(t) => Some(ValueKey::Timestamp(*t)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Utf8(s) => f.write_str(s),
            Self::Timestamp(t) => write!(f, "{t}"),
        }
    }
}

/// Borrowed, hashable identity of a non-null [`Value`].
///
/// Floats compare by bit pattern after folding `-0.0` into `0.0` and every NaN into one NaN, so
/// distinct counts and group keys are well defined for float columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey<'a> {
    Int(i64),
    Float(u64),
    Bool(bool),
    Text(&'a str),
    Timestamp(NaiveDateTime),
}

impl ValueKey<'_> {
    /// Canonical key for a float.
    pub fn float(v: f64) -> Self {
        ValueKey::Float(canonical_float(v).to_bits())
    }
}

/// `v` with `-0.0` folded into `0.0` and every NaN into one NaN.
pub fn canonical_float(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the dataset.
    pub fn column_count(&self) -> usize {
        self.schema.fields.len()
    }
}

/// Named datasets analysed together, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSetCollection {
    datasets: IndexMap<String, DataSet>,
}

impl DataSetCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset under `name`, returning the dataset it replaced, if any.
    ///
    /// Replacing keeps the original insertion position.
    pub fn insert(&mut self, name: impl Into<String>, dataset: DataSet) -> Option<DataSet> {
        self.datasets.insert(name.into(), dataset)
    }

    /// Builder-style variant of [`DataSetCollection::insert`].
    pub fn with(mut self, name: impl Into<String>, dataset: DataSet) -> Self {
        self.insert(name, dataset);
        self
    }

    pub fn get(&self, name: &str) -> Option<&DataSet> {
        self.datasets.get(name)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Dataset names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    /// `(name, dataset)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataSet)> {
        self.datasets.iter().map(|(k, v)| (k.as_str(), v))
    }
}
