use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// `database.url` value that selects the in-memory backend.
pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_DATABASE_URL
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub images_dir: PathBuf,
    /// Bytes.
    pub max_image_size: u64,
    /// Prefix prepended to stored image keys in responses.
    pub media_url: String,
}

impl StorageConfig {
    pub fn image_url(&self, key: &str) -> String {
        format!("{}/{}", self.media_url.trim_end_matches('/'), key)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    /// JSON array of `{name, measurement_unit}` loaded on startup.
    pub ingredients_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", MEMORY_DATABASE_URL)?
            .set_default("auth.token_ttl_days", 7)?
            .set_default("storage.images_dir", "./media/recipes")?
            .set_default("storage.max_image_size", 5 * 1024 * 1024)?
            .set_default("storage.media_url", "/media/recipes")?
            .add_source(File::with_name("config/config").required(false))
            // e.g. FOODGRAM__AUTH__JWT_SECRET
            .add_source(Environment::with_prefix("FOODGRAM").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
