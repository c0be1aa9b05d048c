//! Pairwise Pearson correlation between numeric columns.

use polars::prelude::{ChunkAgg, Float64Chunked, NewChunkedArray};
use serde::Serialize;

use crate::typed::{Column, NumericColumn, TypedDataSet};

/// A pair of numeric columns whose correlation exceeded the configured threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationFinding {
    pub left: String,
    pub right: String,
    /// Pearson correlation coefficient.
    pub coefficient: f64,
    /// Rows where both columns are non-null.
    pub rows: usize,
}

/// Every numeric column pair (in column order) with `|r| > threshold`.
///
/// Only rows where both sides are non-null and not NaN are used. Pairs with fewer than two such rows, or
/// with zero variance on either side, have no defined coefficient and are skipped.
pub fn strong_correlations(dataset: &TypedDataSet<'_>, threshold: f64) -> Vec<CorrelationFinding> {
    let numeric: Vec<&NumericColumn<'_>> = dataset
        .columns()
        .iter()
        .filter_map(|c| match c {
            Column::Numeric(n) => Some(n),
            _ => None,
        })
        .collect();

    let mut out = Vec::new();
    for (i, left) in numeric.iter().enumerate() {
        for right in &numeric[i + 1..] {
            if let Some((coefficient, rows)) = pearson(left, right) {
                if coefficient.abs() > threshold {
                    out.push(CorrelationFinding {
                        left: left.name.to_string(),
                        right: right.name.to_string(),
                        coefficient,
                        rows,
                    });
                }
            }
        }
    }
    out
}

fn pearson(left: &NumericColumn<'_>, right: &NumericColumn<'_>) -> Option<(f64, usize)> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = left
        .cells
        .iter()
        .zip(&right.cells)
        .filter_map(|(a, b)| Some((a.as_ref()?.as_f64(), b.as_ref()?.as_f64())))
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .unzip();
    let n = xs.len();
    if n < 2 {
        return None;
    }

    let x = Float64Chunked::from_vec("x".into(), xs);
    let y = Float64Chunked::from_vec("y".into(), ys);
    let dx = &x - x.mean()?;
    let dy = &y - y.mean()?;
    let sxy = (&dx * &dy).sum()?;
    let sxx = (&dx * &dx).sum()?;
    let syy = (&dy * &dy).sum()?;
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    let r = sxy / (sxx.sqrt() * syy.sqrt());
    r.is_finite().then_some((r, n))
}

#[cfg(test)]
mod tests {
    use super::strong_correlations;
    use crate::typed::TypedDataSet;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn dataset() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("observed", DataType::Float64),
            Field::new("forecasted", DataType::Float64),
            Field::new("noise", DataType::Float64),
            Field::new("label", DataType::Utf8),
            Field::new("constant", DataType::Int64),
        ]);
        let rows = [(1.0, 2.0, 5.0), (2.0, 4.1, -1.0), (3.0, 6.0, 4.0), (4.0, 8.2, -3.0)]
            .iter()
            .map(|&(a, b, c)| {
                vec![
                    Value::Float64(a),
                    Value::Float64(b),
                    Value::Float64(c),
                    Value::Utf8("x".into()),
                    Value::Int64(7),
                ]
            })
            .collect();
        DataSet::new(schema, rows)
    }

    #[test]
    fn reports_strongly_correlated_pairs_only() {
        let ds = dataset();
        let typed = TypedDataSet::new(&ds).unwrap();
        let found = strong_correlations(&typed, 0.9);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].left, "observed");
        assert_eq!(found[0].right, "forecasted");
        assert!(found[0].coefficient > 0.99);
        assert_eq!(found[0].rows, 4);
    }

    #[test]
    fn nan_rows_are_left_out_of_the_pair() {
        let schema = Schema::new(vec![
            Field::new("observed", DataType::Float64),
            Field::new("forecasted", DataType::Float64),
        ]);
        let rows = [(1.0, 2.0), (2.0, f64::NAN), (3.0, 6.0), (4.0, 8.0)]
            .iter()
            .map(|&(a, b)| vec![Value::Float64(a), Value::Float64(b)])
            .collect();
        let ds = DataSet::new(schema, rows);
        let typed = TypedDataSet::new(&ds).unwrap();
        let found = strong_correlations(&typed, 0.9);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rows, 3);
        assert!((found[0].coefficient - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_columns_are_skipped() {
        let ds = dataset();
        let typed = TypedDataSet::new(&ds).unwrap();
        assert!(strong_correlations(&typed, 0.0)
            .iter()
            .all(|f| f.left != "constant" && f.right != "constant"));
    }
}
