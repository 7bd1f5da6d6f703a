use std::path::Path;

use async_trait::async_trait;

use crate::errors::AppError;

/// Remote object store that hosts media files.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteAssetStore: Send + Sync {
    /// Uploads a local file and returns its public URL
    async fn upload(&self, local_path: &Path, public_id: &str) -> Result<String, AppError>;
}
