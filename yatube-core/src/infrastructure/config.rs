use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::page::DEFAULT_PAGE_SIZE;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub media_root: PathBuf,
    pub page_size: u64,
    /// Lifetime of cached index pages; zero disables the cache.
    pub index_cache_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let db_max_connections = lookup("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "20".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid DB_MAX_CONNECTIONS: {}", e))?;
        let media_root = lookup("MEDIA_ROOT")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "media".into())
            .into();
        let page_size: u64 = lookup("PAGE_SIZE")
            .unwrap_or_else(|| DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PAGE_SIZE: {}", e))?;
        if page_size == 0 {
            anyhow::bail!("PAGE_SIZE must be positive");
        }
        let index_cache_ttl = lookup("INDEX_CACHE_TTL_SECS")
            .unwrap_or_else(|| "20".into())
            .parse()
            .map(Duration::from_secs)
            .map_err(|e| anyhow::anyhow!("invalid INDEX_CACHE_TTL_SECS: {}", e))?;

        Ok(Self {
            database_url,
            db_max_connections,
            media_root,
            page_size,
            index_cache_ttl,
        })
    }
}
