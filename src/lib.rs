//! Energy brokerage saving-study engine.
//!
//! Prices a supply point's consumption against the marketers' tariff catalog
//! and suggests the cheapest eligible rates, margins and commissions included.

pub mod cache;
pub mod config;
pub mod error;
pub mod studies;
pub mod tariffs;

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::CatalogCache;
use crate::config::Config;
use crate::studies::StudyService;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: CatalogCache,
    pub studies: StudyService,
    pub config: Arc<Config>,
}

/// Assemble the HTTP API
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(studies::router())
        .merge(tariffs::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
