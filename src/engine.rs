use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{error, info};

/// Terminal status of one workflow launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowExit {
    pub success: bool,
    /// Process exit code when the engine reported one.
    pub code: Option<i32>,
}

/// Abstraction over the engine that executes named workflows.
///
/// Workflows are assumed non-idempotent or expensive; a failed launch is
/// never retried here.
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    /// Launch a workflow and wait for its terminal status. Parameters pass
    /// through unvalidated; their semantics belong to the engine.
    async fn launch(&self, workflow: &str, params: &[String]) -> Result<WorkflowExit>;
}

/// Launches workflows through an external launcher executable, invoked as
/// `<launcher> <workflow> <params…>`.
pub struct CliWorkflowEngine {
    launcher: String,
}

impl CliWorkflowEngine {
    pub fn new(launcher: impl Into<String>) -> Self {
        Self {
            launcher: launcher.into(),
        }
    }
}

#[async_trait]
impl WorkflowEngine for CliWorkflowEngine {
    async fn launch(&self, workflow: &str, params: &[String]) -> Result<WorkflowExit> {
        info!(workflow, ?params, launcher = %self.launcher, "launching workflow");
        let output = tokio::process::Command::new(&self.launcher)
            .arg(workflow)
            .args(params)
            .output()
            .await
            .with_context(|| format!("spawning workflow launcher {}", self.launcher))?;

        if !output.status.success() {
            error!(
                workflow,
                code = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "workflow run failed"
            );
        }
        Ok(WorkflowExit {
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}
