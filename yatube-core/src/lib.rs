//! Data and access layer of a small blogging platform: posts, topic groups,
//! comments and the follow graph, with paginated feeds and validated
//! submissions. Rendering, routing and sessions belong to the host.

pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;

pub use application::Services;
pub use data::Repositories;
pub use domain::error::DomainError;

use infrastructure::cache::FeedCache;
use infrastructure::config::AppConfig;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::media::MediaStorage;

/// Connects to PostgreSQL, applies pending migrations and builds the services.
pub async fn connect(config: &AppConfig) -> anyhow::Result<Services> {
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;
    Ok(Services::new(
        Repositories::postgres(pool),
        MediaStorage::new(config.media_root.clone()),
        FeedCache::new(config.index_cache_ttl),
    ))
}
