//! End-to-end acceptance harness for warehouse-loading batch workflows.
//!
//! A scenario seeds a fixture dataset into the storage location a workflow
//! expects as input, launches that workflow by name through an external
//! engine, then validates the workflow's warehouse output against a golden
//! CSV with an order-independent, type-aware table comparison.
//!
//! The workflow engine, the warehouse, and the remote store are external
//! collaborators behind trait seams (`WorkflowEngine`, `Warehouse`,
//! `RemoteStore`); the harness itself is the orchestration and validation
//! layer.

pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod remote_store;
pub mod scenario;
pub mod stager;
pub mod table;
pub mod types;
pub mod warehouse;

// Re-export the types most callers need for convenient imports.
pub use compare::{ComparePolicy, ComparisonReport, NullOrdering};
pub use config::AcceptanceConfig;
pub use error::AcceptanceError;
pub use scenario::{run_scenario, ScenarioEnv, ScenarioOutcome};
pub use table::{ColumnType, Table, Value};
pub use types::{FixtureSpec, ScenarioSpec, WorkflowRequest};
