use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::compare::NullOrdering;
use crate::table::ColumnType;

/// A local fixture file and the remote partition it stands in for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSpec {
    /// Local path of the fixture file.
    pub local_path: String,
    /// Dataset path under the warehouse root, exactly as the workflow's own
    /// writer lays it out (e.g. `course_catalog/catalog`).
    pub dataset_root: String,
    /// Partition date, rendered into the key as `dt=YYYY-MM-DD`.
    pub partition_date: NaiveDate,
    /// Filename within the partition.
    pub filename: String,
}

/// A named workflow plus the parameters to launch it with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub workflow: String,
    /// Flat ordered list alternating flags and values, passed through
    /// unvalidated to the engine.
    #[serde(default)]
    pub params: Vec<String>,
}

/// A complete acceptance scenario: what to stage, what to launch, and how
/// to validate the output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    pub fixture: FixtureSpec,
    pub workflow: WorkflowRequest,
    /// Output query; `{schema}` is substituted with the configured schema.
    pub query: String,
    /// Column names in the exact order the query selects them.
    pub columns: Vec<String>,
    /// Reference CSV path with a header row.
    pub expected_csv: String,
    /// Columns to sort both tables by before comparison.
    #[serde(default)]
    pub sort_keys: Vec<String>,
    /// Per-column parsers applied to both tables.
    #[serde(default)]
    pub typed_columns: BTreeMap<String, ColumnType>,
    /// Absolute tolerance for float columns; exact equality when unset.
    #[serde(default)]
    pub float_epsilon: Option<f64>,
    #[serde(default)]
    pub null_ordering: NullOrdering,
}
