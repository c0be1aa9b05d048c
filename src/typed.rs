//! Typed, column-major view of a [`DataSet`].
//!
//! A [`TypedDataSet`] is built once per analysis. Building it checks that every cell matches the
//! declared type of its column and dispatches each column into one of the three [`Column`]
//! variants, so the profiler, key detector, validators, and rule interpreter never look at a
//! cell's runtime type again.
//!
//! Every column is also materialized as a polars [`Series`]. Null and distinct counts come from
//! that series and are computed once, at build time. Row projections (group keys, duplicate
//! detection) stay on the typed cells: a null is its own group key there, and floats group by
//! their canonical value.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use polars::prelude::{NamedFrom, Series};

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{canonical_float, ColumnKind, DataSet, DataType, Value, ValueKey};

/// Identity of one row projected onto a list of columns. Nulls are part of the key.
pub type RowKey<'a> = Vec<Option<ValueKey<'a>>>;

/// A non-null numeric cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }

    pub fn key(self) -> ValueKey<'static> {
        match self {
            Self::Int(v) => ValueKey::Int(v),
            Self::Float(v) => ValueKey::float(v),
        }
    }

    fn total_cmp(self, other: Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(&b),
            (a, b) => a.as_f64().total_cmp(&b.as_f64()),
        }
    }
}

/// A non-null categorical cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category<'a> {
    Text(&'a str),
    Bool(bool),
}

impl<'a> Category<'a> {
    pub fn key(self) -> ValueKey<'a> {
        match self {
            Self::Text(s) => ValueKey::Text(s),
            Self::Bool(b) => ValueKey::Bool(b),
        }
    }
}

impl fmt::Display for Category<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A column as a polars [`Series`], with the counts every consumer needs.
#[derive(Debug, Clone)]
pub struct ColumnFacts {
    /// Floats are stored canonically (`-0.0` as `0.0`, one NaN). Timestamps are stored as
    /// microseconds since the epoch.
    pub series: Series,
    pub null_count: usize,
    /// Distinct non-null values.
    pub distinct_count: usize,
}

impl ColumnFacts {
    fn new(series: Series) -> AnalysisResult<Self> {
        let null_count = series.null_count();
        // polars counts null as one more unique value.
        let distinct_count = series
            .n_unique()?
            .saturating_sub(usize::from(null_count > 0));
        Ok(Self {
            series,
            null_count,
            distinct_count,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NumericColumn<'a> {
    pub name: &'a str,
    pub data_type: DataType,
    pub cells: Vec<Option<Number>>,
    pub facts: ColumnFacts,
}

impl NumericColumn<'_> {
    /// Returns `true` for `Int64` columns.
    pub fn is_integer(&self) -> bool {
        self.data_type == DataType::Int64
    }

    /// Non-null values as `f64`, in row order. NaN included.
    pub fn values(&self) -> impl Iterator<Item = f64> {
        self.cells.iter().flatten().map(|n| n.as_f64())
    }

    /// Non-null, non-NaN values as `f64`, in row order.
    pub fn numbers(&self) -> impl Iterator<Item = f64> {
        self.values().filter(|v| !v.is_nan())
    }

    pub fn nan_count(&self) -> usize {
        self.values().filter(|v| v.is_nan()).count()
    }
}

#[derive(Debug, Clone)]
pub struct CategoricalColumn<'a> {
    pub name: &'a str,
    pub data_type: DataType,
    pub cells: Vec<Option<Category<'a>>>,
    pub facts: ColumnFacts,
}

#[derive(Debug, Clone)]
pub struct TemporalColumn<'a> {
    pub name: &'a str,
    pub cells: Vec<Option<NaiveDateTime>>,
    pub facts: ColumnFacts,
}

/// One column of a [`TypedDataSet`], tagged by kind.
#[derive(Debug, Clone)]
pub enum Column<'a> {
    Numeric(NumericColumn<'a>),
    Categorical(CategoricalColumn<'a>),
    Temporal(TemporalColumn<'a>),
}

impl<'a> Column<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Self::Numeric(c) => c.name,
            Self::Categorical(c) => c.name,
            Self::Temporal(c) => c.name,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Numeric(c) => c.data_type,
            Self::Categorical(c) => c.data_type,
            Self::Temporal(_) => DataType::Timestamp,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.data_type().kind()
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(c) => c.cells.len(),
            Self::Categorical(c) => c.cells.len(),
            Self::Temporal(c) => c.cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identity of the cell at `row`, or `None` if it is null.
    pub fn key(&self, row: usize) -> Option<ValueKey<'a>> {
        match self {
            Self::Numeric(c) => c.cells[row].map(Number::key),
            Self::Categorical(c) => c.cells[row].map(Category::key),
            Self::Temporal(c) => c.cells[row].map(ValueKey::Timestamp),
        }
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.key(row).is_none()
    }

    /// The cell at `row` as text, or `None` if it is null.
    pub fn render(&self, row: usize) -> Option<String> {
        match self {
            Self::Numeric(c) => c.cells[row].map(|n| match n {
                Number::Int(v) => v.to_string(),
                Number::Float(v) => v.to_string(),
            }),
            Self::Categorical(c) => c.cells[row].map(|v| v.to_string()),
            Self::Temporal(c) => c.cells[row].map(|t| t.to_string()),
        }
    }

    pub fn facts(&self) -> &ColumnFacts {
        match self {
            Self::Numeric(c) => &c.facts,
            Self::Categorical(c) => &c.facts,
            Self::Temporal(c) => &c.facts,
        }
    }

    pub fn series(&self) -> &Series {
        &self.facts().series
    }

    pub fn null_count(&self) -> usize {
        self.facts().null_count
    }

    /// Number of distinct non-null values.
    pub fn distinct_count(&self) -> usize {
        self.facts().distinct_count
    }

    /// Orders two rows of this column by value. Nulls sort first.
    pub fn compare_rows(&self, a: usize, b: usize) -> Ordering {
        match self {
            Self::Numeric(c) => cmp_nulls_first(c.cells[a], c.cells[b], Number::total_cmp),
            Self::Categorical(c) => cmp_nulls_first(c.cells[a], c.cells[b], |x, y| match (x, y) {
                (Category::Text(x), Category::Text(y)) => x.cmp(y),
                (Category::Bool(x), Category::Bool(y)) => x.cmp(&y),
                (Category::Bool(_), Category::Text(_)) => Ordering::Less,
                (Category::Text(_), Category::Bool(_)) => Ordering::Greater,
            }),
            Self::Temporal(c) => cmp_nulls_first(c.cells[a], c.cells[b], |x, y| x.cmp(&y)),
        }
    }
}

fn cmp_nulls_first<T: Copy>(
    a: Option<T>,
    b: Option<T>,
    cmp: impl Fn(T, T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => cmp(x, y),
    }
}

/// Column-major, type-checked view over a borrowed [`DataSet`].
#[derive(Debug, Clone)]
pub struct TypedDataSet<'a> {
    columns: Vec<Column<'a>>,
    row_count: usize,
}

impl<'a> TypedDataSet<'a> {
    /// Check and dispatch every column of `dataset`.
    ///
    /// Fails with [`AnalysisError::EmptyDataset`] when the schema has no fields,
    /// [`AnalysisError::RaggedRow`] when a row does not match the schema width, and
    /// [`AnalysisError::InvalidColumnType`] when a cell disagrees with its declared type.
    pub fn new(dataset: &'a DataSet) -> AnalysisResult<Self> {
        let width = dataset.column_count();
        if width == 0 {
            return Err(AnalysisError::EmptyDataset);
        }
        for (row, values) in dataset.rows.iter().enumerate() {
            if values.len() != width {
                return Err(AnalysisError::RaggedRow {
                    row,
                    expected: width,
                    actual: values.len(),
                });
            }
        }

        let columns = dataset
            .schema
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| build_column(dataset, idx, field.name.as_str(), field.data_type))
            .collect::<AnalysisResult<Vec<_>>>()?;

        Ok(Self {
            columns,
            row_count: dataset.row_count(),
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column<'a>] {
        &self.columns
    }

    /// Column position by name, or [`AnalysisError::MissingDesignatedColumn`].
    pub fn column_index(&self, name: &str) -> AnalysisResult<usize> {
        self.columns
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| AnalysisError::MissingDesignatedColumn {
                column: name.to_string(),
                available: self.columns.iter().map(|c| c.name().to_string()).collect(),
            })
    }

    /// Column by name, or [`AnalysisError::MissingDesignatedColumn`].
    pub fn column(&self, name: &str) -> AnalysisResult<&Column<'a>> {
        let idx = self.column_index(name)?;
        Ok(&self.columns[idx])
    }

    /// Project row `row` onto `columns`.
    pub fn row_key(&self, row: usize, columns: &[usize]) -> RowKey<'a> {
        columns.iter().map(|&c| self.columns[c].key(row)).collect()
    }

    /// Group row indexes by their projection onto `columns`, in first-seen group order.
    ///
    /// Nulls form their own group. Group order and the row lists feed the mapping-key and
    /// monotonicity checks, which need row positions rather than aggregates.
    pub fn group_rows(&self, columns: &[usize]) -> IndexMap<RowKey<'a>, Vec<usize>> {
        let mut groups: IndexMap<RowKey<'a>, Vec<usize>> = IndexMap::new();
        for row in 0..self.row_count {
            groups.entry(self.row_key(row, columns)).or_default().push(row);
        }
        groups
    }

    /// Rows whose projection onto `columns` repeats an earlier row's projection.
    ///
    /// This is `row_count - distinct projections`, so each extra copy of a row counts once.
    pub fn duplicate_count(&self, columns: &[usize]) -> usize {
        let mut seen = HashSet::with_capacity(self.row_count);
        (0..self.row_count)
            .filter(|&row| !seen.insert(self.row_key(row, columns)))
            .count()
    }

    /// Duplicate count over every column.
    pub fn duplicate_row_count(&self) -> usize {
        let all: Vec<usize> = (0..self.columns.len()).collect();
        self.duplicate_count(&all)
    }
}

fn build_column<'a>(
    dataset: &'a DataSet,
    idx: usize,
    name: &'a str,
    declared: DataType,
) -> AnalysisResult<Column<'a>> {
    let mismatch = |row: usize, found: &Value| AnalysisError::InvalidColumnType {
        column: name.to_string(),
        declared,
        row,
        found: found
            .data_type()
            .map(|t| format!("{t:?}"))
            .unwrap_or_else(|| "null".to_string()),
    };
    let cells = dataset.rows.iter().map(|row| &row[idx]).enumerate();

    let column = match declared {
        DataType::Int64 | DataType::Float64 => {
            let cells: Vec<Option<Number>> = cells
                .map(|(row, v)| match (declared, v) {
                    (_, Value::Null) => Ok(None),
                    (DataType::Int64, Value::Int64(n)) => Ok(Some(Number::Int(*n))),
                    (DataType::Float64, Value::Float64(n)) => Ok(Some(Number::Float(*n))),
                    (_, other) => Err(mismatch(row, other)),
                })
                .collect::<AnalysisResult<_>>()?;
            let series = if declared == DataType::Int64 {
                let values: Vec<Option<i64>> = cells
                    .iter()
                    .map(|c| match c {
                        Some(Number::Int(v)) => Some(*v),
                        _ => None,
                    })
                    .collect();
                Series::new(name.into(), values)
            } else {
                let values: Vec<Option<f64>> = cells
                    .iter()
                    .map(|c| c.map(|n| canonical_float(n.as_f64())))
                    .collect();
                Series::new(name.into(), values)
            };
            Column::Numeric(NumericColumn {
                name,
                data_type: declared,
                facts: ColumnFacts::new(series)?,
                cells,
            })
        }
        DataType::Bool | DataType::Utf8 => {
            let cells: Vec<Option<Category<'a>>> = cells
                .map(|(row, v)| match (declared, v) {
                    (_, Value::Null) => Ok(None),
                    (DataType::Utf8, Value::Utf8(s)) => Ok(Some(Category::Text(s.as_str()))),
                    (DataType::Bool, Value::Bool(b)) => Ok(Some(Category::Bool(*b))),
                    (_, other) => Err(mismatch(row, other)),
                })
                .collect::<AnalysisResult<_>>()?;
            let series = if declared == DataType::Bool {
                let values: Vec<Option<bool>> = cells
                    .iter()
                    .map(|c| match c {
                        Some(Category::Bool(b)) => Some(*b),
                        _ => None,
                    })
                    .collect();
                Series::new(name.into(), values)
            } else {
                let values: Vec<Option<&str>> = cells
                    .iter()
                    .map(|c| match c {
                        Some(Category::Text(s)) => Some(*s),
                        _ => None,
                    })
                    .collect();
                Series::new(name.into(), values)
            };
            Column::Categorical(CategoricalColumn {
                name,
                data_type: declared,
                facts: ColumnFacts::new(series)?,
                cells,
            })
        }
        DataType::Timestamp => {
            let cells: Vec<Option<NaiveDateTime>> = cells
                .map(|(row, v)| match v {
                    Value::Null => Ok(None),
                    Value::Timestamp(t) => Ok(Some(*t)),
                    other => Err(mismatch(row, other)),
                })
                .collect::<AnalysisResult<_>>()?;
            let micros: Vec<Option<i64>> = cells
                .iter()
                .map(|c| c.map(|t| t.and_utc().timestamp_micros()))
                .collect();
            Column::Temporal(TemporalColumn {
                name,
                facts: ColumnFacts::new(Series::new(name.into(), micros))?,
                cells,
            })
        }
    };
    Ok(column)
}
