use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::error::AcceptanceError;
use crate::table::{Table, Value};

/// Abstraction over the queryable store holding workflow output tables.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Execute a query and return raw rows. Cells come back as text (or
    /// null); the comparator applies column parsers afterwards.
    async fn execute(&self, sql: &str) -> Result<Vec<Vec<Value>>>;
}

/// Runs queries through an external SQL client that prints CSV with a
/// header row on stdout, e.g. `psql --csv`.
pub struct CliWarehouse {
    program: String,
    args: Vec<String>,
}

impl CliWarehouse {
    /// Split a whitespace-separated command line such as
    /// `psql --csv -h warehouse.internal -U etl`.
    pub fn from_command(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().context("warehouse client command is empty")?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl Warehouse for CliWarehouse {
    async fn execute(&self, sql: &str) -> Result<Vec<Vec<Value>>> {
        debug!(sql, client = %self.program, "executing warehouse query");
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg("-c")
            .arg(sql)
            .output()
            .await
            .with_context(|| format!("spawning warehouse client {}", self.program))?;

        if !output.status.success() {
            anyhow::bail!(
                "warehouse client exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        parse_csv_rows(&output.stdout)
    }
}

/// Parse client CSV output into raw rows, skipping the header line. Empty
/// fields are nulls.
fn parse_csv_rows(bytes: &[u8]) -> Result<Vec<Vec<Value>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("parsing warehouse CSV output")?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Value::Null
                    } else {
                        Value::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(rows)
}

/// Execute `sql` and zip the raw rows with `columns` positionally.
///
/// Callers must supply columns in the exact order the query selects them;
/// no column-name introspection happens here. A failed query is fatal — it
/// signals the workflow did not produce the expected output.
pub async fn fetch_table(
    warehouse: &dyn Warehouse,
    sql: &str,
    columns: &[String],
) -> Result<Table, AcceptanceError> {
    let rows = warehouse
        .execute(sql)
        .await
        .map_err(|source| AcceptanceError::Query {
            sql: sql.to_string(),
            source,
        })?;
    Table::new(columns.to_vec(), rows).map_err(|source| AcceptanceError::Query {
        sql: sql.to_string(),
        source,
    })
}
