mod local;
#[cfg(any(feature = "gcs", feature = "aws"))]
mod object_store_backend;

pub use local::LocalRemoteStore;
#[cfg(any(feature = "gcs", feature = "aws"))]
pub use object_store_backend::{parse_object_store_url, ObjectStoreRemote};

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over the remote store a workflow reads its input from and
/// writes its intermediate data to.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Copy a local file to `remote_key`, overwriting any existing object.
    /// Re-running with the same arguments leaves the store unchanged.
    async fn put(&self, local_path: &Path, remote_key: &str) -> Result<()>;

    /// Read an object back by key.
    async fn get(&self, remote_key: &str) -> Result<Vec<u8>>;
}

/// Build the remote store for a configured location.
///
/// Cloud URLs (`gs://…`, `s3://…`) use the object_store backend.
/// Everything else is treated as a local filesystem path.
pub fn build_remote_store(location: &str) -> Result<Arc<dyn RemoteStore>> {
    if location.starts_with("gs://") || location.starts_with("s3://") {
        #[cfg(any(feature = "gcs", feature = "aws"))]
        {
            let store = ObjectStoreRemote::from_url(location)?;
            return Ok(Arc::new(store));
        }
        #[cfg(not(any(feature = "gcs", feature = "aws")))]
        {
            let _ = location;
            anyhow::bail!("REMOTE_STORE with a cloud URL requires the 'gcs' or 'aws' feature flag")
        }
    }
    Ok(Arc::new(LocalRemoteStore::new(location.into())))
}
