//! Geo Semantic Cache
//!
//! A geocoding gateway that answers repeated or near-duplicate lookups from a
//! bounded in-memory cache:
//! - Forward lookups matched by embedding similarity of normalized addresses
//! - Reverse lookups matched by great-circle distance
//! - FIFO eviction at capacity with a TTL-bounded exact-key index
//! - Nominatim geocoding and OpenAI-compatible embeddings with a hash fallback

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use api::state::AppState;
use config::EmbeddingConfig;
use infrastructure::{
    embedding::{EmbeddingStrategy, OpenAiEmbeddingProvider},
    geo_cache::InMemoryGeoCache,
    geocoding::NominatimGeoProvider,
    http_client::HttpClient,
    services::{GeocodingService, GeocodingServiceConfig},
};

/// Create the application state with the given configuration
pub fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let service = create_geocoding_service(config)?;

    Ok(AppState::new(Arc::new(service)))
}

/// Wire the cache, geo provider and embedding strategy into a geocoding service
pub fn create_geocoding_service(config: &AppConfig) -> anyhow::Result<GeocodingService> {
    let cache_config = config.cache.clone().sanitized();
    let cache = Arc::new(InMemoryGeoCache::with_config(cache_config));

    let lookup_timeout = Duration::from_secs(config.geocoding.timeout_secs);
    let geo_client = HttpClient::with_timeout(lookup_timeout)?;
    let geo_provider = Arc::new(NominatimGeoProvider::with_base_url(
        geo_client,
        &config.geocoding.user_agent,
        &config.geocoding.base_url,
    ));

    let embedder = create_embedding_strategy(&config.embedding)?;

    info!(
        geo_provider = %config.geocoding.base_url,
        embedding_provider = embedder.provider_name(),
        dimensions = embedder.dimensions(),
        "Geocoding service configured"
    );

    let service_config = GeocodingServiceConfig::default()
        .with_lookup_timeout(lookup_timeout)
        .with_reverse_radius(config.geocoding.reverse_radius_meters)
        .with_autocomplete_limit(config.geocoding.autocomplete_limit);

    Ok(GeocodingService::with_config(
        cache,
        geo_provider,
        embedder,
        service_config,
    ))
}

fn create_embedding_strategy(config: &EmbeddingConfig) -> anyhow::Result<EmbeddingStrategy> {
    if !config.enabled {
        info!(
            dimensions = config.dimensions,
            "Embedding provider disabled, using hash embeddings"
        );
        return Ok(EmbeddingStrategy::fallback_only(config.dimensions));
    }

    let timeout = Duration::from_millis(config.timeout_ms);
    let client = HttpClient::with_timeout(timeout)?;
    let provider = OpenAiEmbeddingProvider::with_base_url(
        client,
        config.api_key.clone(),
        &config.base_url,
        &config.model,
        config.dimensions,
    );

    Ok(EmbeddingStrategy::primary(Arc::new(provider), timeout))
}
