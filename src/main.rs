use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use energy_broker::cache::{start_cache_warmer, CatalogCache};
use energy_broker::config::Config;
use energy_broker::studies::{StudyService, StudyStore};
use energy_broker::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("energy_broker=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    let cache = CatalogCache::new(config.catalog_cache_ttl);
    tokio::spawn(start_cache_warmer(
        cache.clone(),
        db.clone(),
        config.catalog_cache_ttl,
    ));

    let state = AppState {
        db,
        cache,
        studies: StudyService::new(StudyStore::new(), config.engine),
        config: Arc::new(config.clone()),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
