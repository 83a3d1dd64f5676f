use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::key::AssetKey;
use super::traits::AssetStore;

/// Filesystem-backed image store.
///
/// Files live at `{base_path}/{key}`, so `base_path` can be served as-is
/// under the media URL. Writes go through `.tmp` and are renamed into place
/// so readers never see a partial file.
pub struct FilesystemAssetStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemAssetStore {
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn asset_path(&self, key: &AssetKey) -> PathBuf {
        self.base_path.join(key.to_string())
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl AssetStore for FilesystemAssetStore {
    async fn put(&self, data: &[u8], extension: &str) -> Result<AssetKey, StorageError> {
        let size = data.len() as u64;
        if size > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }

        let key = AssetKey::for_content(data, extension);
        let path = self.asset_path(&key);
        if fs::try_exists(&path).await? {
            return Ok(key);
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(key = %key, size, "Stored asset");
        Ok(key)
    }
}
