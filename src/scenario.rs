use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::compare::{normalize_and_compare, ComparePolicy, ComparisonReport};
use crate::config::AcceptanceConfig;
use crate::engine::WorkflowEngine;
use crate::error::AcceptanceError;
use crate::remote_store::RemoteStore;
use crate::stager::FixtureStager;
use crate::table::Table;
use crate::types::ScenarioSpec;
use crate::warehouse::{fetch_table, Warehouse};

/// Terminal outcome of a scenario that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioOutcome {
    Pass,
    /// Tables differ after normalization. A reported test failure, not a
    /// crash — the report carries the row/column detail.
    Mismatch(ComparisonReport),
}

impl ScenarioOutcome {
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Everything a scenario needs from its surroundings.
///
/// Built once per environment and passed in explicitly, never held as
/// ambient singletons, so harness tests can run scenarios against isolated
/// environments. Scenarios share nothing mutable; running independent
/// scenarios in parallel is safe only when they use disjoint remote keys
/// and warehouse schemas, which scenario authors must ensure.
#[derive(Clone)]
pub struct ScenarioEnv {
    pub remote_store: Arc<dyn RemoteStore>,
    pub engine: Arc<dyn WorkflowEngine>,
    pub warehouse: Arc<dyn Warehouse>,
    pub config: AcceptanceConfig,
}

impl fmt::Debug for ScenarioEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioEnv")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Run one scenario to completion: stage the fixture, launch the workflow,
/// fetch the output table, load the expected table, compare.
///
/// A straight-line sequence with no branching and no retries — the scenario
/// aborts at the first failing step, and the error names that step.
pub async fn run_scenario(
    env: &ScenarioEnv,
    spec: &ScenarioSpec,
) -> Result<ScenarioOutcome, AcceptanceError> {
    info!(scenario = %spec.name, "starting acceptance scenario");

    let stager = FixtureStager::new(
        Arc::clone(&env.remote_store),
        env.config.warehouse_root.clone(),
    );
    stager
        .stage(
            Path::new(&spec.fixture.local_path),
            &spec.fixture.dataset_root,
            spec.fixture.partition_date,
            &spec.fixture.filename,
        )
        .await
        .map_err(AcceptanceError::Staging)?;

    let exit = env
        .engine
        .launch(&spec.workflow.workflow, &spec.workflow.params)
        .await
        .map_err(|source| AcceptanceError::Invocation {
            workflow: spec.workflow.workflow.clone(),
            params: spec.workflow.params.clone(),
            source,
        })?;
    if !exit.success {
        return Err(AcceptanceError::Invocation {
            workflow: spec.workflow.workflow.clone(),
            params: spec.workflow.params.clone(),
            source: anyhow::anyhow!("workflow exited with status {:?}", exit.code),
        });
    }
    info!(workflow = %spec.workflow.workflow, "workflow completed");

    let sql = spec.query.replace("{schema}", &env.config.schema);
    let actual = fetch_table(env.warehouse.as_ref(), &sql, &spec.columns).await?;
    info!(rows = actual.row_count(), "fetched output table");

    let expected = Table::from_csv_path(Path::new(&spec.expected_csv), &spec.typed_columns)?;

    let policy = ComparePolicy {
        sort_keys: spec.sort_keys.clone(),
        typed_columns: spec.typed_columns.clone(),
        float_epsilon: spec.float_epsilon,
        null_ordering: spec.null_ordering,
        diff_row_limit: env.config.diff_row_limit,
    };
    let report = normalize_and_compare(&actual, &expected, &policy)?;

    if report.is_match() {
        info!(scenario = %spec.name, "scenario passed");
        Ok(ScenarioOutcome::Pass)
    } else {
        warn!(scenario = %spec.name, report = %report, "scenario mismatch");
        Ok(ScenarioOutcome::Mismatch(report))
    }
}
