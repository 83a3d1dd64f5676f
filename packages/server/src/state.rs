use std::sync::Arc;

use anyhow::Context;
use foodgram_common::Store;
use foodgram_common::memory::MemoryStore;
use foodgram_common::storage::AssetStore;
use foodgram_common::storage::filesystem::FilesystemAssetStore;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::store::SeaOrmStore;
use crate::{database, seed};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub images: Arc<dyn AssetStore>,
    pub config: AppConfig,
}

impl AppState {
    /// Connects the configured backend, prepares image storage and runs the
    /// optional ingredient seed.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let store = open_store(&config).await?;

        if let Some(path) = &config.seed.ingredients_file {
            seed::load_ingredients(&*store, path).await?;
        }

        let images = FilesystemAssetStore::new(
            config.storage.images_dir.clone(),
            config.storage.max_image_size,
        )
        .await
        .with_context(|| {
            format!(
                "Failed to prepare image directory {}",
                config.storage.images_dir.display()
            )
        })?;

        Ok(Self {
            store,
            images: Arc::new(images),
            config,
        })
    }
}

pub async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    if config.database.is_memory() {
        warn!("Using the in-memory store; all data is lost on shutdown");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    seed::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;
    info!("Database ready");
    Ok(Arc::new(SeaOrmStore::new(db)))
}
