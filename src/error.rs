use std::fmt;

/// Errors from acceptance-scenario steps.
///
/// Every variant is fatal: the scenario aborts at the failing step with no
/// retry. Infrastructure is either available or the test environment is
/// broken; retrying a systemic failure only hides flakiness. A comparison
/// mismatch is deliberately NOT an error — it is the harness's designed
/// terminal outcome, reported via `ScenarioOutcome::Mismatch`.
#[derive(Debug)]
pub enum AcceptanceError {
    /// Remote store write failed while staging a fixture.
    Staging(anyhow::Error),
    /// Workflow exited non-zero or the engine was unreachable.
    Invocation {
        workflow: String,
        params: Vec<String>,
        source: anyhow::Error,
    },
    /// Warehouse query failed (bad SQL, schema or table absent).
    Query {
        sql: String,
        source: anyhow::Error,
    },
    /// Reference fixture missing a column, or a cell in either table could
    /// not be parsed into its declared column type.
    FixtureFormat(String),
}

impl AcceptanceError {
    /// The scenario step this error aborted at.
    pub const fn step(&self) -> &'static str {
        match self {
            Self::Staging(_) => "staging",
            Self::Invocation { .. } => "workflow invocation",
            Self::Query { .. } => "output query",
            Self::FixtureFormat(_) => "table normalization",
        }
    }
}

impl fmt::Display for AcceptanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staging(err) => write!(f, "staging failed: {err}"),
            Self::Invocation {
                workflow,
                params,
                source,
            } => write!(
                f,
                "workflow invocation failed: {workflow} {}: {source}",
                params.join(" ")
            ),
            Self::Query { sql, source } => write!(f, "output query failed: {sql}: {source}"),
            Self::FixtureFormat(msg) => write!(f, "fixture format error: {msg}"),
        }
    }
}

impl std::error::Error for AcceptanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Staging(err)
            | Self::Invocation { source: err, .. }
            | Self::Query { source: err, .. } => Some(err.as_ref()),
            Self::FixtureFormat(_) => None,
        }
    }
}
