//! v1 geocoding API endpoints

pub mod cache;
pub mod geocode;

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/geocode", post(geocode::geocode))
        .route("/reverse", post(geocode::reverse_geocode))
        .route("/autocomplete", get(geocode::autocomplete))
        .route("/cache", delete(cache::clear_cache))
        .route("/cache/stats", get(cache::get_stats))
        .route("/cache/cleanup", post(cache::cleanup_cache))
}
