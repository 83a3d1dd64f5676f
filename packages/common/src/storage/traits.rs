use async_trait::async_trait;

use super::error::StorageError;
use super::key::AssetKey;

/// Content-addressed storage for recipe images.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store bytes under their content key. Storing identical bytes twice is a no-op.
    async fn put(&self, data: &[u8], extension: &str) -> Result<AssetKey, StorageError>;
}
