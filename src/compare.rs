use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AcceptanceError;
use crate::table::{ColumnType, Table, Value};

/// Where nulls land when sorting by a key column.
///
/// Observed workflow output does not pin this down, so it is an explicit
/// policy rather than an inferred behavior. The default sorts nulls first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullOrdering {
    #[default]
    NullsFirst,
    NullsLast,
}

/// Default number of mismatching rows itemized in a report.
pub const DEFAULT_DIFF_ROW_LIMIT: usize = 5;

/// Normalization and equality policy for one comparison.
#[derive(Debug, Clone)]
pub struct ComparePolicy {
    /// Columns to sort both tables by, ascending, before positional
    /// comparison. Ties keep their pre-sort relative order (stable sort),
    /// so duplicate rows are preserved and counted.
    pub sort_keys: Vec<String>,
    /// Per-column parsers applied to both tables.
    pub typed_columns: BTreeMap<String, ColumnType>,
    /// Absolute tolerance for float cells; `None` compares exactly.
    pub float_epsilon: Option<f64>,
    pub null_ordering: NullOrdering,
    /// Maximum mismatching rows itemized in the report.
    pub diff_row_limit: usize,
}

impl Default for ComparePolicy {
    fn default() -> Self {
        Self {
            sort_keys: Vec::new(),
            typed_columns: BTreeMap::new(),
            float_epsilon: None,
            null_ordering: NullOrdering::default(),
            diff_row_limit: DEFAULT_DIFF_ROW_LIMIT,
        }
    }
}

/// One differing cell within a row.
#[derive(Debug, Clone, PartialEq)]
pub struct CellDiff {
    pub column: String,
    pub expected: Value,
    pub actual: Value,
}

/// A row that differs, identified by its position after sorting plus the
/// expected row's sort-key values.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDiff {
    pub row: usize,
    pub keys: Vec<(String, Value)>,
    pub cells: Vec<CellDiff>,
}

/// Outcome of normalizing and comparing two tables.
///
/// Mismatch variants retain enough row/column detail to diagnose without
/// re-running the workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonReport {
    Match,
    /// Column sets differ. `missing` are expected columns absent from the
    /// actual table; `unexpected` are actual columns the expected table
    /// does not have. Column order is not compared.
    ColumnsDiffer {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    RowCountDiffers {
        expected: usize,
        actual: usize,
    },
    CellsDiffer {
        /// Total differing rows, including those beyond the itemized sample.
        differing_rows: usize,
        sample: Vec<RowDiff>,
    },
}

impl ComparisonReport {
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match => write!(f, "tables match"),
            Self::ColumnsDiffer { missing, unexpected } => {
                write!(f, "column sets differ:")?;
                if !missing.is_empty() {
                    write!(f, " missing [{}]", missing.join(", "))?;
                }
                if !unexpected.is_empty() {
                    write!(f, " unexpected [{}]", unexpected.join(", "))?;
                }
                Ok(())
            }
            Self::RowCountDiffers { expected, actual } => {
                write!(f, "row counts differ: expected {expected}, actual {actual}")
            }
            Self::CellsDiffer {
                differing_rows,
                sample,
            } => {
                writeln!(
                    f,
                    "{differing_rows} row(s) differ after normalization (showing {}):",
                    sample.len()
                )?;
                for diff in sample {
                    write!(f, "  row {}", diff.row)?;
                    if !diff.keys.is_empty() {
                        let keys: Vec<String> = diff
                            .keys
                            .iter()
                            .map(|(k, v)| format!("{k}={v}"))
                            .collect();
                        write!(f, " [{}]", keys.join(", "))?;
                    }
                    writeln!(f, ":")?;
                    for cell in &diff.cells {
                        writeln!(
                            f,
                            "    {}: expected {}, actual {}",
                            cell.column, cell.expected, cell.actual
                        )?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Normalize both tables and compare them cell by cell.
///
/// Normalization: apply the policy's column parsers to both tables, sort
/// both by the sort keys ascending (stable), and drop pre-sort ordinals so
/// row identity is purely positional. Comparison: column sets must be equal
/// (order is not), then row counts, then cells row-by-row and
/// column-by-column with type-aware equality.
///
/// Sorting removes dependence on the non-deterministic row order a
/// distributed workflow may produce; permuting the actual table's rows does
/// not change the outcome as long as the sort keys order rows uniquely.
pub fn normalize_and_compare(
    actual: &Table,
    expected: &Table,
    policy: &ComparePolicy,
) -> Result<ComparisonReport, AcceptanceError> {
    let actual = apply_types(actual, &policy.typed_columns)
        .map_err(|e| AcceptanceError::FixtureFormat(format!("actual table: {e}")))?;
    let expected = apply_types(expected, &policy.typed_columns)
        .map_err(|e| AcceptanceError::FixtureFormat(format!("expected table: {e}")))?;

    // Column sets must agree before rows can be aligned. While checking,
    // build the index map that reorders actual cells into expected order.
    let mut missing = Vec::new();
    let mut reorder = Vec::with_capacity(expected.columns().len());
    for column in expected.columns() {
        match actual.column_index(column) {
            Some(i) => reorder.push(i),
            None => missing.push(column.clone()),
        }
    }
    let unexpected: Vec<String> = actual
        .columns()
        .iter()
        .filter(|c| expected.column_index(c).is_none())
        .cloned()
        .collect();
    if !missing.is_empty() || !unexpected.is_empty() {
        return Ok(ComparisonReport::ColumnsDiffer { missing, unexpected });
    }

    let columns = expected.columns();
    let mut key_indices = Vec::with_capacity(policy.sort_keys.len());
    for key in &policy.sort_keys {
        let i = expected.column_index(key).ok_or_else(|| {
            AcceptanceError::FixtureFormat(format!("sort key '{key}' is not a column"))
        })?;
        key_indices.push(i);
    }

    let mut actual_rows: Vec<Vec<Value>> = actual
        .rows()
        .iter()
        .map(|row| reorder.iter().map(|&i| row[i].clone()).collect())
        .collect();
    let mut expected_rows = expected.rows().to_vec();
    sort_rows(&mut actual_rows, &key_indices, policy.null_ordering);
    sort_rows(&mut expected_rows, &key_indices, policy.null_ordering);

    if actual_rows.len() != expected_rows.len() {
        return Ok(ComparisonReport::RowCountDiffers {
            expected: expected_rows.len(),
            actual: actual_rows.len(),
        });
    }

    let mut differing_rows = 0;
    let mut sample = Vec::new();
    for (row, (expected_row, actual_row)) in expected_rows.iter().zip(&actual_rows).enumerate() {
        let cells: Vec<CellDiff> = columns
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                !values_equal(&actual_row[*i], &expected_row[*i], policy.float_epsilon)
            })
            .map(|(i, column)| CellDiff {
                column: column.clone(),
                expected: expected_row[i].clone(),
                actual: actual_row[i].clone(),
            })
            .collect();
        if cells.is_empty() {
            continue;
        }
        differing_rows += 1;
        if sample.len() < policy.diff_row_limit {
            let keys = key_indices
                .iter()
                .map(|&i| (columns[i].clone(), expected_row[i].clone()))
                .collect();
            sample.push(RowDiff { row, keys, cells });
        }
    }

    if differing_rows == 0 {
        Ok(ComparisonReport::Match)
    } else {
        Ok(ComparisonReport::CellsDiffer {
            differing_rows,
            sample,
        })
    }
}

fn apply_types(table: &Table, typed: &BTreeMap<String, ColumnType>) -> Result<Table, String> {
    let parsers: Vec<Option<ColumnType>> = table
        .columns()
        .iter()
        .map(|c| typed.get(c).copied())
        .collect();
    if parsers.iter().all(Option::is_none) {
        return Ok(table.clone());
    }

    let mut rows = Vec::with_capacity(table.row_count());
    for (row_idx, row) in table.rows().iter().enumerate() {
        let mut cells = Vec::with_capacity(row.len());
        for ((cell, parser), column) in row.iter().zip(&parsers).zip(table.columns()) {
            let cell = match parser {
                Some(t) => t
                    .parse(cell)
                    .map_err(|e| format!("row {row_idx} column '{column}': {e}"))?,
                None => cell.clone(),
            };
            cells.push(cell);
        }
        rows.push(cells);
    }
    Ok(Table::from_parts_unchecked(table.columns().to_vec(), rows))
}

fn sort_rows(rows: &mut [Vec<Value>], key_indices: &[usize], nulls: NullOrdering) {
    if key_indices.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for &i in key_indices {
            match cmp_values(&a[i], &b[i], nulls) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        Ordering::Equal
    });
}

/// Total ordering over cells for sorting. Nulls land per policy; values of
/// different non-null types order by a fixed type rank so mixed-typed key
/// columns still sort deterministically.
#[allow(clippy::cast_precision_loss)]
fn cmp_values(a: &Value, b: &Value, nulls: NullOrdering) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => match nulls {
            NullOrdering::NullsFirst => Ordering::Less,
            NullOrdering::NullsLast => Ordering::Greater,
        },
        (_, Value::Null) => cmp_values(b, a, nulls).reverse(),
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
        (Value::Integer(x), Value::Float(y)) => (*x as f64).total_cmp(y),
        (Value::Float(x), Value::Integer(y)) => x.total_cmp(&(*y as f64)),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

const fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Integer(_) | Value::Float(_) => 1,
        Value::Date(_) => 2,
        Value::Text(_) => 3,
    }
}

/// Type-aware cell equality. Floats honor the configured epsilon; all other
/// comparisons require the same variant and value. Two nulls are equal.
fn values_equal(actual: &Value, expected: &Value, epsilon: Option<f64>) -> bool {
    match (actual, expected) {
        (Value::Float(x), Value::Float(y)) => {
            epsilon.map_or(x == y, |eps| (x - y).abs() <= eps)
        }
        _ => actual == expected,
    }
}
