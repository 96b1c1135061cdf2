//! Geocoding request and response bodies

use serde::{Deserialize, Serialize};

use crate::domain::geo::AddressSuggestion;
use crate::domain::geo_cache::GeoCacheStats;

/// POST /v1/geocode
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeRequest {
    pub address: String,
}

/// POST /v1/reverse
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReverseGeocodeRequest {
    pub lat: f64,
    pub lng: f64,
}

/// GET /v1/autocomplete?q=
#[derive(Debug, Clone, Deserialize)]
pub struct AutocompleteParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutocompleteResponse {
    pub suggestions: Vec<AddressSuggestion>,
}

/// Cache statistics with the derived hit rate
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    #[serde(flatten)]
    pub stats: GeoCacheStats,
    pub hit_rate: f32,
}

impl From<GeoCacheStats> for CacheStatsResponse {
    fn from(stats: GeoCacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupResponse {
    pub removed: usize,
}
