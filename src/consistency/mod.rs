//! Declarative consistency rules.
//!
//! A [`ConsistencyRule`] names a [`Relation`] over one or two columns. [`evaluate_rules`]
//! interprets each rule against every row and reports the number of violating rows, so the same
//! checker serves any dataset shape.
//!
//! Supported relations:
//!
//! - [`Relation::AbsoluteValue`]: `derived == abs(source)`, exactly or within an epsilon
//! - [`Relation::NonNegative`]: `column >= 0`
//! - [`Relation::MonotonicWithinGroup`]: `column` never moves against `direction` within a group
//!
//! Rules are plain data and deserialize from JSON:
//!
//! ```rust
//! use dataset_integrity::consistency::{ConsistencyRule, Relation, Tolerance};
//!
//! let rule: ConsistencyRule = serde_json::from_str(
//!     r#"{"name": "abs error", "relation": "absolute_value", "source": "error", "derived": "absolute_error"}"#,
//! )
//! .unwrap();
//! assert!(matches!(
//!     rule.relation,
//!     Relation::AbsoluteValue { tolerance: Tolerance::Exact, .. }
//! ));
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::typed::{Column, Number, NumericColumn, TypedDataSet};

/// Allowed difference for floating-point equality relations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// Bit-for-bit equality, for values produced by the same computation.
    #[default]
    Exact,
    /// `|lhs - rhs| <= epsilon`, for values that went through upstream rounding.
    Epsilon(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    NonDecreasing,
    NonIncreasing,
}

/// The closed set of relations the checker understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "relation", rename_all = "snake_case")]
pub enum Relation {
    AbsoluteValue {
        source: String,
        derived: String,
        #[serde(default)]
        tolerance: Tolerance,
    },
    NonNegative {
        column: String,
    },
    MonotonicWithinGroup {
        column: String,
        #[serde(default)]
        group_by: Vec<String>,
        /// Row order inside a group. Input order when absent.
        #[serde(default)]
        order_by: Option<String>,
        #[serde(default)]
        direction: Direction,
    },
}

impl Relation {
    pub fn kind(&self) -> RelationKind {
        match self {
            Self::AbsoluteValue { .. } => RelationKind::AbsoluteValue,
            Self::NonNegative { .. } => RelationKind::NonNegative,
            Self::MonotonicWithinGroup { .. } => RelationKind::MonotonicWithinGroup,
        }
    }

    /// Columns the relation reads, in declaration order.
    pub fn columns(&self) -> Vec<String> {
        match self {
            Self::AbsoluteValue {
                source, derived, ..
            } => vec![source.clone(), derived.clone()],
            Self::NonNegative { column } => vec![column.clone()],
            Self::MonotonicWithinGroup {
                column,
                group_by,
                order_by,
                ..
            } => std::iter::once(column.clone())
                .chain(group_by.iter().cloned())
                .chain(order_by.iter().cloned())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    AbsoluteValue,
    NonNegative,
    MonotonicWithinGroup,
}

/// A named relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyRule {
    pub name: String,
    #[serde(flatten)]
    pub relation: Relation,
}

impl ConsistencyRule {
    pub fn new(name: impl Into<String>, relation: Relation) -> Self {
        Self {
            name: name.into(),
            relation,
        }
    }

    /// `derived` must equal `abs(source)` exactly.
    pub fn absolute_value(
        name: impl Into<String>,
        source: impl Into<String>,
        derived: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            Relation::AbsoluteValue {
                source: source.into(),
                derived: derived.into(),
                tolerance: Tolerance::Exact,
            },
        )
    }

    /// `column` must not be negative.
    pub fn non_negative(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(
            name,
            Relation::NonNegative {
                column: column.into(),
            },
        )
    }
}

/// Outcome of one rule. Zero violations means the rule passes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyFinding {
    pub rule: String,
    pub relation: RelationKind,
    pub columns: Vec<String>,
    /// Rows the relation was evaluated on.
    pub evaluated_rows: usize,
    /// Rows skipped because the relevant values were null.
    pub skipped_rows: usize,
    pub violations: usize,
    /// Largest observed deviation from the relation, when one is defined.
    pub max_deviation: Option<f64>,
}

impl ConsistencyFinding {
    pub fn passes(&self) -> bool {
        self.violations == 0
    }
}

#[derive(Debug, Default)]
struct Tally {
    evaluated: usize,
    skipped: usize,
    violations: usize,
    max_deviation: Option<f64>,
}

impl Tally {
    fn deviation(&mut self, d: f64) {
        self.max_deviation = Some(self.max_deviation.map_or(d, |m| m.max(d)));
    }
}

/// Evaluate every rule in order.
pub fn evaluate_rules(
    dataset: &TypedDataSet<'_>,
    rules: &[ConsistencyRule],
) -> AnalysisResult<Vec<ConsistencyFinding>> {
    rules.iter().map(|r| evaluate_rule(dataset, r)).collect()
}

/// Evaluate one rule against every row.
pub fn evaluate_rule(
    dataset: &TypedDataSet<'_>,
    rule: &ConsistencyRule,
) -> AnalysisResult<ConsistencyFinding> {
    let tally = match &rule.relation {
        Relation::AbsoluteValue {
            source,
            derived,
            tolerance,
        } => {
            let source = numeric(dataset, rule, source)?;
            let derived = numeric(dataset, rule, derived)?;
            check_absolute_value(source, derived, *tolerance)
        }
        Relation::NonNegative { column } => check_non_negative(numeric(dataset, rule, column)?),
        Relation::MonotonicWithinGroup {
            column,
            group_by,
            order_by,
            direction,
        } => check_monotonic(dataset, rule, column, group_by, order_by.as_deref(), *direction)?,
    };

    Ok(ConsistencyFinding {
        rule: rule.name.clone(),
        relation: rule.relation.kind(),
        columns: rule.relation.columns(),
        evaluated_rows: tally.evaluated,
        skipped_rows: tally.skipped,
        violations: tally.violations,
        max_deviation: tally.max_deviation,
    })
}

fn numeric<'d, 'a>(
    dataset: &'d TypedDataSet<'a>,
    rule: &ConsistencyRule,
    column: &str,
) -> AnalysisResult<&'d NumericColumn<'a>> {
    match dataset.column(column)? {
        Column::Numeric(n) => Ok(n),
        other => Err(AnalysisError::IncompatibleRule {
            rule: rule.name.clone(),
            column: column.to_string(),
            data_type: other.data_type(),
            message: "relation requires a numeric column".to_string(),
        }),
    }
}

/// Both null: skipped. One null: violation. Integers compare in integer arithmetic.
fn check_absolute_value(
    source: &NumericColumn<'_>,
    derived: &NumericColumn<'_>,
    tolerance: Tolerance,
) -> Tally {
    let mut tally = Tally::default();
    for (s, d) in source.cells.iter().zip(&derived.cells) {
        let (s, d) = match (s, d) {
            (None, None) => {
                tally.skipped += 1;
                continue;
            }
            (Some(s), Some(d)) => (*s, *d),
            _ => {
                tally.evaluated += 1;
                tally.violations += 1;
                continue;
            }
        };
        tally.evaluated += 1;

        let (deviation, equal) = match (s, d) {
            (Number::Int(s), Number::Int(d)) => {
                let diff = (i128::from(d) - i128::from(s).abs()).abs();
                (diff as f64, diff == 0)
            }
            (s, d) => {
                let expected = s.as_f64().abs();
                let d = d.as_f64();
                ((d - expected).abs(), d == expected)
            }
        };
        tally.deviation(deviation);

        let ok = match tolerance {
            Tolerance::Exact => equal,
            Tolerance::Epsilon(eps) => deviation <= eps,
        };
        if !ok {
            tally.violations += 1;
        }
    }
    tally
}

fn check_non_negative(column: &NumericColumn<'_>) -> Tally {
    let mut tally = Tally::default();
    for cell in &column.cells {
        let Some(v) = cell else {
            tally.skipped += 1;
            continue;
        };
        tally.evaluated += 1;
        let v = v.as_f64();
        if v < 0.0 {
            tally.violations += 1;
            tally.deviation(-v);
        }
    }
    tally
}

/// A row violates when it moves against the running extreme of its group. Violating rows do not
/// move the extreme.
fn check_monotonic(
    dataset: &TypedDataSet<'_>,
    rule: &ConsistencyRule,
    column: &str,
    group_by: &[String],
    order_by: Option<&str>,
    direction: Direction,
) -> AnalysisResult<Tally> {
    let value_idx = dataset.column_index(column)?;
    let value_col = &dataset.columns()[value_idx];
    if matches!(value_col, Column::Categorical(_)) {
        return Err(AnalysisError::IncompatibleRule {
            rule: rule.name.clone(),
            column: column.to_string(),
            data_type: value_col.data_type(),
            message: "monotonicity requires a numeric or temporal column".to_string(),
        });
    }
    let group_idxs = group_by
        .iter()
        .map(|g| dataset.column_index(g))
        .collect::<AnalysisResult<Vec<_>>>()?;
    let order_col = order_by
        .map(|o| dataset.column(o))
        .transpose()?;

    let mut tally = Tally::default();
    for (_, mut rows) in dataset.group_rows(&group_idxs) {
        if let Some(order) = order_col {
            rows.sort_by(|&a, &b| order.compare_rows(a, b));
        }

        let mut extreme: Option<usize> = None;
        for row in rows {
            if value_col.is_null(row) {
                tally.skipped += 1;
                continue;
            }
            tally.evaluated += 1;
            let Some(prev) = extreme else {
                extreme = Some(row);
                continue;
            };
            let against = match direction {
                Direction::NonDecreasing => Ordering::Less,
                Direction::NonIncreasing => Ordering::Greater,
            };
            if value_col.compare_rows(row, prev) == against {
                tally.violations += 1;
                if let Column::Numeric(n) = value_col {
                    if let (Some(a), Some(b)) = (n.cells[row], n.cells[prev]) {
                        tally.deviation((a.as_f64() - b.as_f64()).abs());
                    }
                }
            } else {
                extreme = Some(row);
            }
        }
    }
    Ok(tally)
}
