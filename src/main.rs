use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use warehouse_acceptance::config::AcceptanceConfig;
use warehouse_acceptance::engine::CliWorkflowEngine;
use warehouse_acceptance::remote_store::build_remote_store;
use warehouse_acceptance::scenario::{run_scenario, ScenarioEnv, ScenarioOutcome};
use warehouse_acceptance::types::ScenarioSpec;
use warehouse_acceptance::warehouse::CliWarehouse;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(spec_path) = std::env::args().nth(1) else {
        eprintln!("usage: warehouse-acceptance <scenario.json>");
        std::process::exit(2);
    };

    let config = match AcceptanceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };

    match run(config, &spec_path).await {
        Ok(ScenarioOutcome::Pass) => {}
        Ok(ScenarioOutcome::Mismatch(report)) => {
            eprintln!("{report}");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("scenario aborted: {e:#}");
            std::process::exit(2);
        }
    }
}

async fn run(config: AcceptanceConfig, spec_path: &str) -> Result<ScenarioOutcome> {
    let raw = std::fs::read_to_string(spec_path)
        .with_context(|| format!("reading scenario spec {spec_path}"))?;
    let spec: ScenarioSpec =
        serde_json::from_str(&raw).with_context(|| format!("parsing scenario spec {spec_path}"))?;

    let env = ScenarioEnv {
        remote_store: build_remote_store(&config.remote_store)?,
        engine: Arc::new(CliWorkflowEngine::new(config.workflow_launcher.clone())),
        warehouse: Arc::new(CliWarehouse::from_command(&config.warehouse_cli)?),
        config,
    };

    Ok(run_scenario(&env, &spec).await?)
}
