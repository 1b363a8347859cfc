use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::RemoteStore;

/// Remote store backed by a local directory. Keys map to paths under the
/// base directory, which is what the workflows under test read in a local
/// environment.
#[derive(Debug)]
pub struct LocalRemoteStore {
    base_dir: PathBuf,
}

impl LocalRemoteStore {
    pub const fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn resolve(&self, remote_key: &str) -> PathBuf {
        self.base_dir.join(remote_key.trim_start_matches('/'))
    }
}

#[async_trait]
impl RemoteStore for LocalRemoteStore {
    async fn put(&self, local_path: &Path, remote_key: &str) -> Result<()> {
        let target = self.resolve(remote_key);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating remote dir {}", parent.display()))?;
        }
        tokio::fs::copy(local_path, &target)
            .await
            .with_context(|| {
                format!("copying {} to {}", local_path.display(), target.display())
            })?;
        Ok(())
    }

    async fn get(&self, remote_key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(remote_key);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading remote object {}", path.display()))
    }
}
