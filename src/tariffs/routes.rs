//! Catalog maintenance and health route handlers

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::AppState;

use super::responses::HealthResponse;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/catalog/invalidate", post(invalidate_catalog))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: state.cache.stats(),
    })
}

/// Drop cached snapshots so the next study reloads the catalog.
async fn invalidate_catalog(State(state): State<AppState>) -> Json<HealthResponse> {
    state.cache.invalidate_all();
    Json(HealthResponse {
        status: "invalidated",
        cache: state.cache.stats(),
    })
}
