//! Shared test infrastructure: fake engine/warehouse implementations,
//! environment builders, and the course-catalog scenario spec.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use warehouse_acceptance::config::AcceptanceConfig;
use warehouse_acceptance::engine::{WorkflowEngine, WorkflowExit};
use warehouse_acceptance::remote_store::LocalRemoteStore;
use warehouse_acceptance::scenario::ScenarioEnv;
use warehouse_acceptance::table::{ColumnType, Value};
use warehouse_acceptance::types::{FixtureSpec, ScenarioSpec, WorkflowRequest};
use warehouse_acceptance::warehouse::Warehouse;
use warehouse_acceptance::NullOrdering;

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR")))
}

/// Unique temp directory standing in for the remote store.
pub fn temp_remote_dir() -> PathBuf {
    std::env::temp_dir().join(format!("wa-remote-{}", uuid::Uuid::new_v4()))
}

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

// ---------- Fakes ----------

/// Warehouse fake that serves canned rows for exact query strings.
#[derive(Default)]
pub struct ScriptedWarehouse {
    responses: Mutex<BTreeMap<String, Vec<Vec<Value>>>>,
}

impl ScriptedWarehouse {
    pub fn load(&self, sql: &str, rows: Vec<Vec<Value>>) {
        self.responses
            .lock()
            .unwrap()
            .insert(sql.to_string(), rows);
    }
}

#[async_trait]
impl Warehouse for ScriptedWarehouse {
    async fn execute(&self, sql: &str) -> Result<Vec<Vec<Value>>> {
        self.responses
            .lock()
            .unwrap()
            .get(sql)
            .cloned()
            .ok_or_else(|| anyhow!("relation does not exist: {sql}"))
    }
}

/// Engine fake standing in for the real batch engine: on launch it checks
/// that the staged input exists at the exact key the workflow would read
/// and, if so, loads the output rows into the scripted warehouse.
pub struct StubEngine {
    pub remote_dir: PathBuf,
    pub input_key: String,
    pub warehouse: Arc<ScriptedWarehouse>,
    pub output_query: String,
    pub output_rows: Vec<Vec<Value>>,
}

#[async_trait]
impl WorkflowEngine for StubEngine {
    async fn launch(&self, _workflow: &str, _params: &[String]) -> Result<WorkflowExit> {
        if !self.remote_dir.join(&self.input_key).exists() {
            // A missing input is a failed run on the engine side, not a crash.
            return Ok(WorkflowExit {
                success: false,
                code: Some(1),
            });
        }
        self.warehouse
            .load(&self.output_query, self.output_rows.clone());
        Ok(WorkflowExit {
            success: true,
            code: Some(0),
        })
    }
}

/// Engine fake that always reports a failed run.
pub struct FailingEngine;

#[async_trait]
impl WorkflowEngine for FailingEngine {
    async fn launch(&self, _workflow: &str, _params: &[String]) -> Result<WorkflowExit> {
        Ok(WorkflowExit {
            success: false,
            code: Some(2),
        })
    }
}

// ---------- Environment & scenario builders ----------

pub fn test_config(remote_dir: &Path) -> AcceptanceConfig {
    AcceptanceConfig {
        remote_store: remote_dir.to_string_lossy().into_owned(),
        warehouse_root: "warehouse".to_string(),
        schema: "testing".to_string(),
        workflow_launcher: "launch-task".to_string(),
        warehouse_cli: "psql --csv".to_string(),
        diff_row_limit: 5,
    }
}

pub fn test_env(
    remote_dir: &Path,
    engine: Arc<dyn WorkflowEngine>,
    warehouse: Arc<dyn Warehouse>,
) -> ScenarioEnv {
    ScenarioEnv {
        remote_store: Arc::new(LocalRemoteStore::new(remote_dir.to_path_buf())),
        engine,
        warehouse,
        config: test_config(remote_dir),
    }
}

/// The key the course-catalog workflow reads its input from, relative to
/// the remote store. Must match what the stager produces.
pub const CATALOG_INPUT_KEY: &str = "warehouse/course_catalog/catalog/dt=2015-06-29/catalog.json";

/// The scenario query after `{schema}` substitution with the test config.
pub const SUBJECTS_QUERY: &str = "SELECT * FROM testing.d_course_subjects";

pub fn course_catalog_spec() -> ScenarioSpec {
    let typed = BTreeMap::from([
        ("row_number".to_string(), ColumnType::Integer),
        ("date".to_string(), ColumnType::Date),
    ]);
    ScenarioSpec {
        name: "course_catalog_subjects".to_string(),
        fixture: FixtureSpec {
            local_path: fixture_path("course_catalog/input/catalog.json")
                .to_string_lossy()
                .into_owned(),
            dataset_root: "course_catalog/catalog".to_string(),
            partition_date: chrono::NaiveDate::from_ymd_opt(2015, 6, 29).unwrap(),
            filename: "catalog.json".to_string(),
        },
        workflow: WorkflowRequest {
            workflow: "CourseCatalogWorkflow".to_string(),
            params: vec!["--date".to_string(), "2015-06-29".to_string()],
        },
        query: "SELECT * FROM {schema}.d_course_subjects".to_string(),
        columns: [
            "row_number",
            "course_id",
            "date",
            "subject_uri",
            "subject_title",
            "subject_language",
        ]
        .iter()
        .map(ToString::to_string)
        .collect(),
        expected_csv: fixture_path("course_catalog/output/expected_subjects_for_acceptance.csv")
            .to_string_lossy()
            .into_owned(),
        sort_keys: vec!["row_number".to_string()],
        typed_columns: typed,
        float_epsilon: None,
        null_ordering: NullOrdering::default(),
    }
}

/// The rows the "workflow" writes to the warehouse, as the raw text cells a
/// CSV-mode client would return. Matches the reference CSV.
pub fn subject_rows() -> Vec<Vec<Value>> {
    vec![
        vec![
            text("1"),
            text("course-v1:edX+DemoX+Demo_2015"),
            text("2015-06-29"),
            text("/course/subject/math"),
            text("Math"),
            text("en"),
        ],
        vec![
            text("2"),
            text("course-v1:edX+DemoX+Demo_2015"),
            text("2015-06-29"),
            text("/course/subject/physics"),
            text("Physics"),
            text("en"),
        ],
        vec![
            text("3"),
            text("course-v1:MITx+6.002x+2015"),
            text("2015-06-29"),
            text("/course/subject/electronics"),
            text("Electronics"),
            text("en"),
        ],
        vec![
            text("4"),
            text("course-v1:MITx+6.002x+2015"),
            text("2015-06-29"),
            text("/course/subject/engineering"),
            text("Engineering"),
            Value::Null,
        ],
    ]
}

/// Build the standard happy-path environment: stub engine wired to the
/// scripted warehouse, both keyed to the course-catalog scenario.
pub fn course_catalog_env(remote_dir: &Path) -> ScenarioEnv {
    let warehouse = Arc::new(ScriptedWarehouse::default());
    let engine = Arc::new(StubEngine {
        remote_dir: remote_dir.to_path_buf(),
        input_key: CATALOG_INPUT_KEY.to_string(),
        warehouse: Arc::clone(&warehouse),
        output_query: SUBJECTS_QUERY.to_string(),
        output_rows: subject_rows(),
    });
    test_env(remote_dir, engine, warehouse)
}
