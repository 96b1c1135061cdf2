//! Forward, reverse and autocomplete handlers

use axum::extract::State;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, AutocompleteParams, AutocompleteResponse, GeocodeRequest, Json, Query,
    ReverseGeocodeRequest,
};
use crate::infrastructure::services::ResolvedLocation;

/// POST /v1/geocode
pub async fn geocode(
    State(state): State<AppState>,
    Json(request): Json<GeocodeRequest>,
) -> Result<Json<ResolvedLocation>, ApiError> {
    debug!(address = %request.address, "Resolving address");

    state
        .geocoding_service
        .resolve_address(&request.address)
        .await
        .map_err(|e| ApiError::from(e).with_param("address"))?
        .map(Json)
        .ok_or_else(|| {
            ApiError::no_match(format!("No location found for '{}'", request.address.trim()))
        })
}

/// POST /v1/reverse
pub async fn reverse_geocode(
    State(state): State<AppState>,
    Json(request): Json<ReverseGeocodeRequest>,
) -> Result<Json<ResolvedLocation>, ApiError> {
    debug!(lat = request.lat, lng = request.lng, "Resolving coordinates");

    state
        .geocoding_service
        .resolve_coordinates(request.lat, request.lng)
        .await
        .map_err(ApiError::from)?
        .map(Json)
        .ok_or_else(|| {
            ApiError::no_match(format!(
                "No place found near ({}, {})",
                request.lat, request.lng
            ))
        })
}

/// GET /v1/autocomplete?q=
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> Result<Json<AutocompleteResponse>, ApiError> {
    let suggestions = state
        .geocoding_service
        .autocomplete(&params.q)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(AutocompleteResponse { suggestions }))
}
