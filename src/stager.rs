use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::remote_store::RemoteStore;

/// Copies local fixture files to the remote location an upstream ingestion
/// step would have written them to, bypassing the real upstream call.
pub struct FixtureStager {
    store: Arc<dyn RemoteStore>,
    warehouse_root: String,
}

impl FixtureStager {
    pub fn new(store: Arc<dyn RemoteStore>, warehouse_root: impl Into<String>) -> Self {
        let warehouse_root = warehouse_root.into().trim_end_matches('/').to_string();
        Self {
            store,
            warehouse_root,
        }
    }

    /// The remote key for one partition file:
    /// `<warehouse_root>/<dataset_root>/dt=<date>/<filename>`.
    ///
    /// `dataset_root` must reproduce the exact layout the workflow's own
    /// output writer uses, nested segments included (the course catalog
    /// workflow reads `course_catalog/catalog`). A wrong key does not raise
    /// here — the workflow silently sees no input and produces an empty or
    /// stale output table, which the comparison then catches.
    pub fn remote_key(&self, dataset_root: &str, partition: NaiveDate, filename: &str) -> String {
        format!(
            "{}/{}/dt={}/{}",
            self.warehouse_root,
            dataset_root.trim_matches('/'),
            partition.format("%Y-%m-%d"),
            filename
        )
    }

    /// Stage a local fixture file, overwriting any previous copy at the same
    /// key. Returns the remote key written.
    pub async fn stage(
        &self,
        local_file: &Path,
        dataset_root: &str,
        partition: NaiveDate,
        filename: &str,
    ) -> Result<String> {
        let key = self.remote_key(dataset_root, partition, filename);
        self.store
            .put(local_file, &key)
            .await
            .with_context(|| format!("staging {} to {key}", local_file.display()))?;
        info!(key = %key, "fixture staged");
        Ok(key)
    }
}
