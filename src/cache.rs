//! In-memory caching using moka
//!
//! Tariff catalogs change rarely (the backoffice edits them a few times a day),
//! so each energy type's snapshot is cached and refreshed in the background.

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::tariffs::catalog::TariffCatalog;
use crate::tariffs::models::EnergyType;
use crate::tariffs::queries;

const ENERGY_TYPES: [EnergyType; 2] = [EnergyType::Electricity, EnergyType::Gas];

/// Application cache holding tariff catalog snapshots
#[derive(Clone)]
pub struct CatalogCache {
    /// Catalog snapshots (energy type -> TariffCatalog)
    pub catalogs: Cache<EnergyType, Arc<TariffCatalog>>,
}

impl CatalogCache {
    /// Create a new cache instance with the given snapshot TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            // One snapshot per energy type
            catalogs: Cache::builder()
                .max_capacity(ENERGY_TYPES.len() as u64)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            catalogs_size: self.catalogs.entry_count(),
        }
    }

    /// Invalidate all snapshots
    pub fn invalidate_all(&self) {
        self.catalogs.invalidate_all();
        info!("All catalog snapshots invalidated");
    }

    /// Store a snapshot, replacing the previous one for its energy type
    pub async fn insert(&self, energy_type: EnergyType, catalog: TariffCatalog) -> Arc<TariffCatalog> {
        let catalog = Arc::new(catalog);
        self.catalogs.insert(energy_type, Arc::clone(&catalog)).await;
        catalog
    }

    /// Get the snapshot for an energy type, loading it from the database on a miss
    pub async fn get_or_load(
        &self,
        db: &PgPool,
        energy_type: EnergyType,
    ) -> Result<Arc<TariffCatalog>, AppError> {
        if let Some(cached) = self.catalogs.get(&energy_type).await {
            debug!("Cache HIT for {} catalog", energy_type);
            return Ok(cached);
        }

        debug!("Cache MISS for {} catalog", energy_type);
        let catalog = queries::load_catalog(db, energy_type).await?;
        Ok(self.insert(energy_type, catalog).await)
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub catalogs_size: u64,
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes it every `period`.
pub async fn start_cache_warmer(cache: CatalogCache, db: PgPool, period: Duration) {
    let mut interval = interval(period);
    loop {
        // First tick completes immediately
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

/// Reload every energy type's snapshot
async fn warm_cache(cache: &CatalogCache, db: &PgPool) {
    info!("Starting catalog warm-up...");

    for energy_type in ENERGY_TYPES {
        match queries::load_catalog(db, energy_type).await {
            Ok(catalog) => {
                cache.insert(energy_type, catalog).await;
            }
            Err(e) => warn!("Failed to warm {} catalog: {}", energy_type, e),
        }
    }

    info!("Catalog warm-up complete. Stats: {:?}", cache.stats());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariffs::catalog::fixtures::electricity_catalog;

    #[tokio::test]
    async fn test_inserted_snapshot_is_served() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        cache.insert(EnergyType::Electricity, electricity_catalog()).await;

        let cached = cache.catalogs.get(&EnergyType::Electricity).await.unwrap();
        assert_eq!(cached.rates().len(), 1);
        assert!(cache.catalogs.get(&EnergyType::Gas).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_all_drops_snapshots() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        cache.insert(EnergyType::Electricity, electricity_catalog()).await;
        cache.invalidate_all();
        assert!(cache.catalogs.get(&EnergyType::Electricity).await.is_none());
    }
}
