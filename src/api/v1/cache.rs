//! Cache administration handlers

use axum::{extract::State, http::StatusCode};
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, CacheStatsResponse, CleanupResponse, Json};

/// GET /v1/cache/stats
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<CacheStatsResponse>, ApiError> {
    let stats = state
        .geocoding_service
        .stats()
        .await
        .map_err(ApiError::from)?;

    Ok(Json(stats.into()))
}

/// DELETE /v1/cache
pub async fn clear_cache(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state
        .geocoding_service
        .clear()
        .await
        .map_err(ApiError::from)?;

    info!("Geo cache cleared");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/cache/cleanup
pub async fn cleanup_cache(
    State(state): State<AppState>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let removed = state
        .geocoding_service
        .cleanup_expired()
        .await
        .map_err(ApiError::from)?;

    info!(removed, "Expired geo cache entries removed");

    Ok(Json(CleanupResponse { removed }))
}
