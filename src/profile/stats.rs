//! Small numeric building blocks shared by the profiler, key detector, and validators.
//!
//! Aggregates are computed by polars over a `Float64Chunked`.

use polars::prelude::{ChunkAgg, ChunkQuantile, ChunkVar, Float64Chunked, NewChunkedArray};
use serde::Serialize;

/// A statistic that may be undefined.
///
/// Statistics over zero values (or a standard deviation over fewer than two) are reported as
/// [`Statistic::Undefined`] instead of a zero or NaN. A defined statistic is always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Statistic {
    Defined(f64),
    Undefined,
}

impl Statistic {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(v),
            Self::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Self::Defined(_))
    }

    /// `Defined` for a finite value, `Undefined` otherwise.
    pub fn from_option(v: Option<f64>) -> Self {
        match v {
            Some(v) if v.is_finite() => Self::Defined(v),
            _ => Self::Undefined,
        }
    }
}

/// `part / whole` as a percentage; undefined when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> Statistic {
    if whole == 0 {
        Statistic::Undefined
    } else {
        Statistic::Defined(part as f64 / whole as f64 * 100.0)
    }
}

/// Descriptive statistics of a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Moments {
    /// Values the statistics were computed over.
    pub count: usize,
    pub min: Statistic,
    pub max: Statistic,
    pub mean: Statistic,
    pub median: Statistic,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: Statistic,
}

impl Moments {
    /// Statistics of `values`. Callers drop nulls and NaN first.
    pub fn from_values(values: Vec<f64>) -> Self {
        let ca = Float64Chunked::from_vec("values".into(), values);
        let count = ca.len();
        let std_dev = if count < 2 {
            Statistic::Undefined
        } else {
            Statistic::from_option(ca.std(1))
        };
        Self {
            count,
            min: Statistic::from_option(ca.min()),
            max: Statistic::from_option(ca.max()),
            mean: Statistic::from_option(ca.mean()),
            median: Statistic::from_option(ca.median()),
            std_dev,
        }
    }
}

/// Distribution of group sizes (rows per distinct value, rows per key combination, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardinalitySummary {
    /// Number of groups observed.
    pub groups: usize,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub mean: Statistic,
    pub std_dev: Statistic,
    /// Every group has the same size. Vacuously `true` when there are no groups.
    pub uniform: bool,
}

impl CardinalitySummary {
    pub fn from_sizes(sizes: impl IntoIterator<Item = usize>) -> Self {
        let sizes: Vec<usize> = sizes.into_iter().collect();
        let min = sizes.iter().min().copied();
        let max = sizes.iter().max().copied();
        let moments = Moments::from_values(sizes.iter().map(|&s| s as f64).collect());
        Self {
            groups: sizes.len(),
            min,
            max,
            mean: moments.mean,
            std_dev: moments.std_dev,
            uniform: min == max,
        }
    }
}
