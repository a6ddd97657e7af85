//! Response DTOs for catalog maintenance endpoints.

use serde::Serialize;

use crate::cache::CacheStats;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache: CacheStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_serializes_cache_stats() {
        let json = serde_json::to_value(HealthResponse {
            status: "ok",
            cache: CacheStats { catalogs_size: 2 },
        })
        .unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["cache"]["catalogs_size"], 2);
    }
}
