/// Configuration for the acceptance harness, read from environment variables.
///
/// Shared test-environment state (store location, warehouse schema, launcher
/// commands) lives here and is handed to each scenario through `ScenarioEnv`
/// rather than ambient singletons, so harness tests can run against isolated
/// environments.
#[derive(Debug, Clone)]
pub struct AcceptanceConfig {
    /// Remote store location. Accepts a local path or a cloud URL
    /// (`gs://…`, `s3://…`).
    /// Controlled by `REMOTE_STORE` (default: `/tmp/acceptance-remote`).
    pub remote_store: String,
    /// Key prefix under the remote store that mirrors the warehouse layout
    /// the workflows read from and write to.
    /// Controlled by `WAREHOUSE_ROOT` (default: `warehouse`).
    pub warehouse_root: String,
    /// Warehouse schema the workflow output tables land in. Substituted for
    /// `{schema}` in scenario queries.
    /// Controlled by `WAREHOUSE_SCHEMA` (default: `acceptance`).
    pub schema: String,
    /// Executable that launches a named workflow on the engine, invoked as
    /// `<launcher> <workflow> <params…>`.
    /// Controlled by `WORKFLOW_LAUNCHER` (default: `launch-task`).
    pub workflow_launcher: String,
    /// Warehouse SQL client command line, whitespace-separated. Must print
    /// CSV with a header row on stdout when given `-c <sql>`.
    /// Controlled by `WAREHOUSE_CLI` (default: `psql --csv`).
    pub warehouse_cli: String,
    /// Maximum mismatching rows itemized in a comparison report.
    /// Controlled by `DIFF_ROW_LIMIT` (default: 5).
    pub diff_row_limit: usize,
}

impl AcceptanceConfig {
    /// Read configuration from environment variables, with defaults suited
    /// to a local test environment.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            remote_store: std::env::var("REMOTE_STORE")
                .unwrap_or_else(|_| "/tmp/acceptance-remote".to_string()),
            warehouse_root: std::env::var("WAREHOUSE_ROOT")
                .unwrap_or_else(|_| "warehouse".to_string()),
            schema: std::env::var("WAREHOUSE_SCHEMA")
                .unwrap_or_else(|_| "acceptance".to_string()),
            workflow_launcher: std::env::var("WORKFLOW_LAUNCHER")
                .unwrap_or_else(|_| "launch-task".to_string()),
            warehouse_cli: std::env::var("WAREHOUSE_CLI")
                .unwrap_or_else(|_| "psql --csv".to_string()),
            diff_row_limit: parse_env_usize("DIFF_ROW_LIMIT", 5)?,
        })
    }
}

pub fn parse_env_usize(name: &str, default: usize) -> Result<usize, String> {
    std::env::var(name).map_or(Ok(default), |v| {
        v.parse::<usize>()
            .map_err(|e| format!("invalid {name}: {e}"))
    })
}
