use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub cache_capacity: usize,
    pub thumbnail_timeout: u64,
    pub cover_timeout: u64,
    pub search_timeout: u64,
    pub user_agent: String,
    pub proxy: Option<String>,
    pub delivery_queue: usize,
    pub thumbnail_max_dimension: Option<u32>,
    pub download_dir: String,
    pub tick_millis: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_capacity: crate::cache::DEFAULT_CAPACITY,
            thumbnail_timeout: 10,
            cover_timeout: 30,
            search_timeout: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            delivery_queue: 64,
            thumbnail_max_dimension: Some(300),
            download_dir: ".".to_string(),
            tick_millis: 16,
        }
    }
}

impl AppConfig {
    // App.toml in the working directory, then COVERS_* environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("App.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("COVERS").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
