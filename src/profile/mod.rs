//! Column profiler.
//!
//! [`profile_columns`] produces one [`ColumnProfile`] per column of a [`TypedDataSet`], in column
//! order. Counts and percentages are taken over every row, nulls included in the denominator.
//! Numeric statistics ignore nulls and NaN (NaN cells are counted separately), and a column with
//! no usable values reports them as [`Statistic::Undefined`].
//!
//! ```rust
//! use dataset_integrity::profile::{profile, ColumnSummary, ProfileOptions};
//! use dataset_integrity::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let ds = DataSet::new(
//!     Schema::new(vec![
//!         Field::new("brand", DataType::Utf8),
//!         Field::new("price", DataType::Float64),
//!     ]),
//!     vec![
//!         vec![Value::Utf8("Fizz".into()), Value::Float64(1.25)],
//!         vec![Value::Utf8("Pop".into()), Value::Null],
//!     ],
//! );
//!
//! let profiles = profile(&ds, &ProfileOptions::default()).unwrap();
//! assert_eq!(profiles[1].null_count, 1);
//! match &profiles[0].summary {
//!     ColumnSummary::Categorical(c) => assert_eq!(c.sample, vec!["Fizz", "Pop"]),
//!     other => panic!("unexpected summary: {other:?}"),
//! }
//! ```

pub mod correlation;
pub mod grouped;
pub mod stats;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::AnalysisResult;
use crate::typed::{
    CategoricalColumn, Category, Column, NumericColumn, TemporalColumn, TypedDataSet,
};
use crate::types::{ColumnKind, DataSet, DataType, ValueKey};

pub use correlation::{strong_correlations, CorrelationFinding};
pub use grouped::{grouped_statistics, GroupStatistics, GroupedStatistics, GroupedStatisticsSpec};
pub use stats::{CardinalitySummary, Moments, Statistic};

/// Profiler configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileOptions {
    /// Maximum number of distinct values captured for categorical columns.
    pub sample_size: usize,
    /// Maximum number of entries in a categorical value distribution.
    pub distribution_size: usize,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            sample_size: 10,
            distribution_size: 10,
        }
    }
}

/// Read-only summary of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub data_type: DataType,
    pub kind: ColumnKind,
    pub row_count: usize,
    pub null_count: usize,
    pub non_null_count: usize,
    /// Distinct non-null values.
    pub distinct_count: usize,
    pub null_pct: Statistic,
    pub distinct_pct: Statistic,
    pub summary: ColumnSummary,
}

/// Kind-specific part of a [`ColumnProfile`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSummary {
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
    Temporal(TemporalSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub min: Statistic,
    pub max: Statistic,
    pub mean: Statistic,
    pub median: Statistic,
    /// Sample standard deviation.
    pub std_dev: Statistic,
    pub negative_count: usize,
    pub zero_count: usize,
    pub positive_count: usize,
    /// NaN cells. They count as non-null values but take part in no statistic above.
    pub nan_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    /// Distinct values in first-seen order, at most `sample_size` of them.
    pub sample: Vec<String>,
    /// More distinct values exist than the sample holds.
    pub sample_truncated: bool,
    /// Most frequent values first; ties keep first-seen order. At most `distribution_size`.
    pub value_distribution: Vec<ValueFrequency>,
    pub distribution_truncated: bool,
}

/// How often one categorical value occurs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueFrequency {
    pub value: String,
    pub count: usize,
    /// Share of all rows, nulls included.
    pub pct: Statistic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalSummary {
    pub earliest: Option<NaiveDateTime>,
    pub latest: Option<NaiveDateTime>,
}

/// Type-check `dataset` and profile every column.
pub fn profile(dataset: &DataSet, options: &ProfileOptions) -> AnalysisResult<Vec<ColumnProfile>> {
    let typed = TypedDataSet::new(dataset)?;
    Ok(profile_columns(&typed, options))
}

/// Profile every column of an already type-checked dataset, in column order.
pub fn profile_columns(dataset: &TypedDataSet<'_>, options: &ProfileOptions) -> Vec<ColumnProfile> {
    dataset
        .columns()
        .par_iter()
        .map(|column| profile_column(column, options))
        .collect()
}

/// Profile a single column.
pub fn profile_column(column: &Column<'_>, options: &ProfileOptions) -> ColumnProfile {
    let row_count = column.len();
    let null_count = column.null_count();
    let distinct_count = column.distinct_count();

    let summary = match column {
        Column::Numeric(c) => ColumnSummary::Numeric(summarize_numeric(c)),
        Column::Categorical(c) => ColumnSummary::Categorical(summarize_categorical(c, options)),
        Column::Temporal(c) => ColumnSummary::Temporal(summarize_temporal(c)),
    };

    ColumnProfile {
        name: column.name().to_string(),
        data_type: column.data_type(),
        kind: column.kind(),
        row_count,
        null_count,
        non_null_count: row_count - null_count,
        distinct_count,
        null_pct: stats::percentage(null_count, row_count),
        distinct_pct: stats::percentage(distinct_count, row_count),
        summary,
    }
}

fn summarize_numeric(column: &NumericColumn<'_>) -> NumericSummary {
    let values: Vec<f64> = column.numbers().collect();

    let mut negative_count = 0;
    let mut zero_count = 0;
    let mut positive_count = 0;
    for &v in &values {
        if v < 0.0 {
            negative_count += 1;
        } else if v == 0.0 {
            zero_count += 1;
        } else {
            positive_count += 1;
        }
    }

    let moments = Moments::from_values(values);
    NumericSummary {
        min: moments.min,
        max: moments.max,
        mean: moments.mean,
        median: moments.median,
        std_dev: moments.std_dev,
        negative_count,
        zero_count,
        positive_count,
        nan_count: column.nan_count(),
    }
}

fn summarize_categorical(
    column: &CategoricalColumn<'_>,
    options: &ProfileOptions,
) -> CategoricalSummary {
    let mut counts: IndexMap<ValueKey<'_>, (Category<'_>, usize)> = IndexMap::new();
    for &category in column.cells.iter().flatten() {
        counts.entry(category.key()).or_insert((category, 0)).1 += 1;
    }

    let sample = counts
        .values()
        .take(options.sample_size)
        .map(|(c, _)| c.to_string())
        .collect();

    let mut frequencies: Vec<(Category<'_>, usize)> = counts.values().copied().collect();
    frequencies.sort_by(|a, b| b.1.cmp(&a.1));
    let rows = column.cells.len();
    let value_distribution = frequencies
        .iter()
        .take(options.distribution_size)
        .map(|&(value, count)| ValueFrequency {
            value: value.to_string(),
            count,
            pct: stats::percentage(count, rows),
        })
        .collect();

    CategoricalSummary {
        sample,
        sample_truncated: counts.len() > options.sample_size,
        value_distribution,
        distribution_truncated: counts.len() > options.distribution_size,
    }
}

fn summarize_temporal(column: &TemporalColumn<'_>) -> TemporalSummary {
    let values = column.cells.iter().flatten();
    TemporalSummary {
        earliest: values.clone().min().copied(),
        latest: values.max().copied(),
    }
}
