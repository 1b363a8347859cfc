use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AcceptanceError;

/// A single table cell.
///
/// Cells arrive as `Text` from CSV-mode warehouse clients and reference
/// fixtures; `ColumnType` parsers promote them to typed values before
/// comparison so equality is semantic, not lexical.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Null => write!(f, "NULL"),
        }
    }
}

/// Parser applied to every cell of a named column before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    /// Calendar date formatted `YYYY-MM-DD`.
    Date,
}

impl ColumnType {
    /// Parse a raw cell into this column's type.
    ///
    /// Nulls and already-typed values pass through, so applying a parser
    /// twice is a no-op. Integers widen to floats for `Float` columns.
    pub fn parse(self, value: &Value) -> Result<Value, String> {
        match (self, value) {
            (_, Value::Null) | (Self::Text, _) => Ok(value.clone()),
            (Self::Integer, Value::Integer(_))
            | (Self::Float, Value::Float(_))
            | (Self::Date, Value::Date(_)) => Ok(value.clone()),
            (Self::Integer, Value::Text(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| format!("invalid integer {s:?}: {e}")),
            (Self::Float, Value::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("invalid float {s:?}: {e}")),
            #[allow(clippy::cast_precision_loss)]
            (Self::Float, Value::Integer(i)) => Ok(Value::Float(*i as f64)),
            (Self::Date, Value::Text(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|e| format!("invalid date {s:?}: {e}")),
            (t, v) => Err(format!("cannot read {v} as {t:?}")),
        }
    }
}

/// Tabular data: an ordered list of column names plus rows whose cells align
/// positionally with that list.
///
/// Row identity is purely positional; after the comparator sorts a table the
/// original ordinals are gone.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table, checking every row against the column arity.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            anyhow::ensure!(
                row.len() == columns.len(),
                "row {i} has {} cells, expected {} columns",
                row.len(),
                columns.len()
            );
        }
        Ok(Self { columns, rows })
    }

    /// Internal constructor for rows already known to match the arity.
    pub(crate) fn from_parts_unchecked(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Load a reference table from a CSV file with a header row.
    ///
    /// Empty fields load as nulls. Columns named in `typed` are parsed with
    /// the given parser; a typed column missing from the header, an
    /// unparsable cell, or a ragged row is a `FixtureFormat` error.
    pub fn from_csv_path(
        path: &Path,
        typed: &BTreeMap<String, ColumnType>,
    ) -> Result<Self, AcceptanceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| {
                AcceptanceError::FixtureFormat(format!("opening {}: {e}", path.display()))
            })?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| {
                AcceptanceError::FixtureFormat(format!("reading {} header: {e}", path.display()))
            })?
            .iter()
            .map(str::to_string)
            .collect();

        for name in typed.keys() {
            if !columns.iter().any(|c| c == name) {
                return Err(AcceptanceError::FixtureFormat(format!(
                    "typed column '{name}' not present in {}",
                    path.display()
                )));
            }
        }

        let parsers: Vec<Option<ColumnType>> =
            columns.iter().map(|c| typed.get(c).copied()).collect();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                AcceptanceError::FixtureFormat(format!(
                    "reading {} row {}: {e}",
                    path.display(),
                    i + 1
                ))
            })?;
            if record.len() != columns.len() {
                return Err(AcceptanceError::FixtureFormat(format!(
                    "{} row {} has {} fields, expected {}",
                    path.display(),
                    i + 1,
                    record.len(),
                    columns.len()
                )));
            }

            let mut cells = Vec::with_capacity(columns.len());
            for ((field, parser), column) in record.iter().zip(&parsers).zip(&columns) {
                let raw = if field.is_empty() {
                    Value::Null
                } else {
                    Value::Text(field.to_string())
                };
                let cell = match parser {
                    Some(t) => t.parse(&raw).map_err(|e| {
                        AcceptanceError::FixtureFormat(format!(
                            "{} row {} column '{column}': {e}",
                            path.display(),
                            i + 1
                        ))
                    })?,
                    None => raw,
                };
                cells.push(cell);
            }
            rows.push(cells);
        }

        Ok(Self { columns, rows })
    }
}
