//! Geocoding service
//!
//! Resolves addresses and coordinates through the semantic geo cache before
//! falling back to the external geo provider. Provider failures and timeouts
//! are reported as misses, never as errors.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::geo::{
    normalize_address, AddressSuggestion, Coordinates, GeoLocation, GeoProvider, StructuredAddress,
};
use crate::domain::geo_cache::{CacheEntry, GeoCache, GeoCacheStats};
use crate::domain::DomainError;
use crate::infrastructure::embedding::EmbeddingStrategy;
use crate::infrastructure::observability::{
    record_lookup, record_provider_call, LookupOutcome, LookupPath,
};

/// Tunables for the geocoding service
#[derive(Debug, Clone)]
pub struct GeocodingServiceConfig {
    /// Upper bound for a single geo provider call
    pub lookup_timeout: Duration,
    /// Radius for reverse cache hits
    pub reverse_radius_meters: f64,
    /// Maximum number of autocomplete suggestions
    pub autocomplete_limit: usize,
}

impl Default for GeocodingServiceConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(5),
            reverse_radius_meters: 100.0,
            autocomplete_limit: 5,
        }
    }
}

impl GeocodingServiceConfig {
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn with_reverse_radius(mut self, meters: f64) -> Self {
        self.reverse_radius_meters = meters.max(0.0);
        self
    }

    pub fn with_autocomplete_limit(mut self, limit: usize) -> Self {
        self.autocomplete_limit = limit.max(1);
        self
    }
}

/// Where a resolved location came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Cache,
    Provider,
}

/// A successfully resolved location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub coordinates: Coordinates,
    pub display_name: String,
    pub address: StructuredAddress,
    pub source: ResultSource,
    /// Cosine similarity of a semantic cache hit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

impl ResolvedLocation {
    fn from_cache(entry: &CacheEntry, similarity: Option<f32>) -> Self {
        Self {
            coordinates: entry.coordinates(),
            display_name: entry.display_name().to_string(),
            address: entry.address().clone(),
            source: ResultSource::Cache,
            similarity,
        }
    }

    fn from_provider(location: GeoLocation) -> Self {
        Self {
            coordinates: location.coordinates,
            display_name: location.display_name,
            address: location.address,
            source: ResultSource::Provider,
            similarity: None,
        }
    }
}

/// Semantic-cache-backed geocoding
#[derive(Debug)]
pub struct GeocodingService {
    cache: Arc<dyn GeoCache>,
    geo_provider: Arc<dyn GeoProvider>,
    embedder: EmbeddingStrategy,
    config: GeocodingServiceConfig,
}

impl GeocodingService {
    /// Create a new geocoding service with default tunables
    pub fn new(
        cache: Arc<dyn GeoCache>,
        geo_provider: Arc<dyn GeoProvider>,
        embedder: EmbeddingStrategy,
    ) -> Self {
        Self::with_config(cache, geo_provider, embedder, GeocodingServiceConfig::default())
    }

    /// Create a new geocoding service with custom tunables
    pub fn with_config(
        cache: Arc<dyn GeoCache>,
        geo_provider: Arc<dyn GeoProvider>,
        embedder: EmbeddingStrategy,
        config: GeocodingServiceConfig,
    ) -> Self {
        Self {
            cache,
            geo_provider,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &GeocodingServiceConfig {
        &self.config
    }

    /// Resolve a free-text address
    ///
    /// Order: exact normalized key, semantic match, external provider. Only a
    /// provider result is inserted into the cache.
    pub async fn resolve_address(
        &self,
        address: &str,
    ) -> Result<Option<ResolvedLocation>, DomainError> {
        let address = address.trim();

        if address.is_empty() {
            return Err(DomainError::validation("Address must not be empty"));
        }

        let normalized = normalize_address(address);

        if normalized.is_empty() {
            return Err(DomainError::validation(
                "Address must contain at least one letter or digit",
            ));
        }

        if let Some(entry) = self.cache.get(&normalized).await? {
            debug!(key = %normalized, "Geo cache key hit");
            record_lookup(LookupPath::Forward, LookupOutcome::KeyHit);
            return Ok(Some(ResolvedLocation::from_cache(&entry, None)));
        }

        let embedded = self.embedder.embed(&normalized).await;

        if let Some(found) = self.cache.find_similar(&normalized, &embedded.vector).await? {
            debug!(
                key = %normalized,
                matched = %found.entry.normalized_key(),
                similarity = found.similarity,
                "Geo cache semantic hit"
            );
            record_lookup(LookupPath::Forward, LookupOutcome::MatchHit);
            return Ok(Some(ResolvedLocation::from_cache(
                &found.entry,
                Some(found.similarity),
            )));
        }

        let location = self
            .call_provider("geocode", self.geo_provider.geocode(address))
            .await
            .flatten();

        match location {
            Some(location) => {
                let embedding_source = embedded.source;
                let entry = CacheEntry::new(address, location.clone(), embedded.vector);
                self.cache.store(entry).await?;

                debug!(
                    key = %normalized,
                    embedding = embedding_source.as_str(),
                    "Geo cache stored provider result"
                );
                record_lookup(LookupPath::Forward, LookupOutcome::Provider);
                Ok(Some(ResolvedLocation::from_provider(location)))
            }
            None => {
                record_lookup(LookupPath::Forward, LookupOutcome::Miss);
                Ok(None)
            }
        }
    }

    /// Resolve a coordinate pair to the nearest known place
    pub async fn resolve_coordinates(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<Option<ResolvedLocation>, DomainError> {
        let coordinates = Coordinates::new(lat, lng)?;

        if let Some(entry) = self
            .cache
            .find_nearby(coordinates, self.config.reverse_radius_meters)
            .await?
        {
            debug!(%coordinates, matched = %entry.normalized_key(), "Geo cache proximity hit");
            record_lookup(LookupPath::Reverse, LookupOutcome::MatchHit);
            return Ok(Some(ResolvedLocation::from_cache(&entry, None)));
        }

        let location = self
            .call_provider("reverse_geocode", self.geo_provider.reverse_geocode(coordinates))
            .await
            .flatten();

        match location {
            Some(location) => {
                // Reverse results are keyed by their display name so later
                // forward lookups of the same place can hit them
                let embedded = self
                    .embedder
                    .embed(&normalize_address(&location.display_name))
                    .await;
                let embedding_source = embedded.source;
                let entry = CacheEntry::new(
                    location.display_name.clone(),
                    location.clone(),
                    embedded.vector,
                );
                self.cache.store(entry).await?;

                debug!(
                    %coordinates,
                    embedding = embedding_source.as_str(),
                    "Geo cache stored reverse result"
                );

                record_lookup(LookupPath::Reverse, LookupOutcome::Provider);
                Ok(Some(ResolvedLocation::from_provider(location)))
            }
            None => {
                record_lookup(LookupPath::Reverse, LookupOutcome::Miss);
                Ok(None)
            }
        }
    }

    /// Uncached search suggestions for a partial address
    pub async fn autocomplete(&self, query: &str) -> Result<Vec<AddressSuggestion>, DomainError> {
        let query = query.trim();

        if query.is_empty() {
            return Ok(Vec::new());
        }

        let suggestions = self
            .call_provider(
                "autocomplete",
                self.geo_provider.autocomplete(query, self.config.autocomplete_limit),
            )
            .await
            .unwrap_or_default();

        Ok(suggestions
            .into_iter()
            .take(self.config.autocomplete_limit)
            .collect())
    }

    /// Get cache statistics
    pub async fn stats(&self) -> Result<GeoCacheStats, DomainError> {
        self.cache.stats().await
    }

    /// Drop all cached entries
    pub async fn clear(&self) -> Result<(), DomainError> {
        self.cache.clear().await
    }

    /// Prune expired entries
    pub async fn cleanup_expired(&self) -> Result<usize, DomainError> {
        self.cache.cleanup_expired().await
    }

    /// Run a provider call under the lookup timeout, turning failures into `None`
    async fn call_provider<T, F>(&self, operation: &'static str, call: F) -> Option<T>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        let start = Instant::now();
        let result = tokio::time::timeout(self.config.lookup_timeout, call).await;
        let elapsed = start.elapsed();

        match result {
            Ok(Ok(value)) => {
                record_provider_call(operation, elapsed, true);
                Some(value)
            }
            Ok(Err(e)) => {
                record_provider_call(operation, elapsed, false);
                warn!(
                    provider = self.geo_provider.provider_name(),
                    operation,
                    "Geo provider call failed: {}",
                    e
                );
                None
            }
            Err(_) => {
                record_provider_call(operation, elapsed, false);
                warn!(
                    provider = self.geo_provider.provider_name(),
                    operation,
                    timeout_ms = self.config.lookup_timeout.as_millis() as u64,
                    "Geo provider call timed out"
                );
                None
            }
        }
    }
}

/// Trait for geocoding service operations
#[async_trait::async_trait]
pub trait GeocodingServiceTrait: Send + Sync + std::fmt::Debug {
    /// Resolve a free-text address
    async fn resolve_address(&self, address: &str)
        -> Result<Option<ResolvedLocation>, DomainError>;

    /// Resolve a coordinate pair
    async fn resolve_coordinates(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<Option<ResolvedLocation>, DomainError>;

    /// Search suggestions for a partial address
    async fn autocomplete(&self, query: &str) -> Result<Vec<AddressSuggestion>, DomainError>;

    /// Get cache statistics
    async fn stats(&self) -> Result<GeoCacheStats, DomainError>;

    /// Drop all cached entries
    async fn clear(&self) -> Result<(), DomainError>;

    /// Prune expired entries
    async fn cleanup_expired(&self) -> Result<usize, DomainError>;
}

#[async_trait::async_trait]
impl GeocodingServiceTrait for GeocodingService {
    async fn resolve_address(
        &self,
        address: &str,
    ) -> Result<Option<ResolvedLocation>, DomainError> {
        GeocodingService::resolve_address(self, address).await
    }

    async fn resolve_coordinates(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<Option<ResolvedLocation>, DomainError> {
        GeocodingService::resolve_coordinates(self, lat, lng).await
    }

    async fn autocomplete(&self, query: &str) -> Result<Vec<AddressSuggestion>, DomainError> {
        GeocodingService::autocomplete(self, query).await
    }

    async fn stats(&self) -> Result<GeoCacheStats, DomainError> {
        GeocodingService::stats(self).await
    }

    async fn clear(&self) -> Result<(), DomainError> {
        GeocodingService::clear(self).await
    }

    async fn cleanup_expired(&self) -> Result<usize, DomainError> {
        GeocodingService::cleanup_expired(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::geo::MockGeoProvider;
    use crate::domain::geo_cache::GeoCacheConfig;
    use crate::infrastructure::geo_cache::InMemoryGeoCache;

    fn pune_station() -> GeoLocation {
        GeoLocation::new(
            Coordinates::new(18.5285, 73.8741).unwrap(),
            "Pune Railway Station, Pune, Maharashtra",
        )
        .with_address(StructuredAddress::new().with_city("Pune").with_state("Maharashtra"))
    }

    fn cache() -> Arc<InMemoryGeoCache> {
        Arc::new(InMemoryGeoCache::with_config(
            GeoCacheConfig::new().with_similarity_threshold(0.85),
        ))
    }

    fn service(geo: MockGeoProvider, cache: Arc<InMemoryGeoCache>) -> GeocodingService {
        GeocodingService::with_config(
            cache,
            Arc::new(geo),
            EmbeddingStrategy::fallback_only(64),
            GeocodingServiceConfig::default().with_lookup_timeout(Duration::from_millis(200)),
        )
    }

    #[tokio::test]
    async fn test_miss_then_key_hit() {
        let mut geo = MockGeoProvider::new();
        geo.expect_geocode()
            .times(1)
            .returning(|_| Ok(Some(pune_station())));
        geo.expect_provider_name().return_const("mock");
        let service = service(geo, cache());

        let first = service.resolve_address("Pune Station, MH").await.unwrap().unwrap();
        let second = service.resolve_address("pune station mh").await.unwrap().unwrap();

        assert_eq!(first.source, ResultSource::Provider);
        assert_eq!(second.source, ResultSource::Cache);
        assert_eq!(second.coordinates, first.coordinates);
        assert!(second.similarity.is_none());

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_semantic_hit_skips_provider() {
        let mut geo = MockGeoProvider::new();
        geo.expect_geocode()
            .times(1)
            .returning(|_| Ok(Some(pune_station())));
        geo.expect_provider_name().return_const("mock");

        let query_vector = vec![1.0, 0.0];
        let similar_vector = vec![0.9, 0.435_889_9];
        let embedder = MockEmbeddingProvider::new("mock", 2)
            .with_vector("pune station", query_vector)
            .with_vector("pune railway station", similar_vector);
        let service = GeocodingService::new(
            cache(),
            Arc::new(geo),
            EmbeddingStrategy::primary(Arc::new(embedder), Duration::from_secs(1)),
        );

        service.resolve_address("Pune Station").await.unwrap().unwrap();
        let hit = service
            .resolve_address("Pune Railway Station")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(hit.source, ResultSource::Cache);
        assert!((hit.similarity.unwrap() - 0.9).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_hit_rate_counts_each_resolution_once() {
        let mut geo = MockGeoProvider::new();
        geo.expect_geocode()
            .times(1)
            .returning(|_| Ok(Some(pune_station())));
        geo.expect_provider_name().return_const("mock");

        let embedder = MockEmbeddingProvider::new("mock", 2)
            .with_vector("pune station", vec![1.0, 0.0])
            .with_vector("pune railway station", vec![0.9, 0.435_889_9]);
        let service = GeocodingService::new(
            cache(),
            Arc::new(geo),
            EmbeddingStrategy::primary(Arc::new(embedder), Duration::from_secs(1)),
        );

        service.resolve_address("Pune Station").await.unwrap().unwrap();
        for _ in 0..4 {
            let hit = service
                .resolve_address("Pune Railway Station")
                .await
                .unwrap()
                .unwrap();
            assert_eq!(hit.source, ResultSource::Cache);
        }

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.misses, 5);
        assert_eq!(stats.match_hits, 4);
        assert_eq!(stats.match_misses, 1);
        assert!((stats.hit_rate() - 0.8).abs() < 1e-6);
    }

    /// Geo provider that answers only after `delay`
    #[derive(Debug)]
    struct SlowGeoProvider {
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl GeoProvider for SlowGeoProvider {
        async fn geocode(&self, _address: &str) -> Result<Option<GeoLocation>, DomainError> {
            tokio::time::sleep(self.delay).await;
            Ok(Some(pune_station()))
        }

        async fn reverse_geocode(
            &self,
            _coordinates: Coordinates,
        ) -> Result<Option<GeoLocation>, DomainError> {
            tokio::time::sleep(self.delay).await;
            Ok(Some(pune_station()))
        }

        async fn autocomplete(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<AddressSuggestion>, DomainError> {
            tokio::time::sleep(self.delay).await;
            Ok(Vec::new())
        }

        fn provider_name(&self) -> &'static str {
            "slow"
        }
    }

    fn slow_service(cache: Arc<InMemoryGeoCache>) -> GeocodingService {
        GeocodingService::with_config(
            cache,
            Arc::new(SlowGeoProvider {
                delay: Duration::from_secs(2),
            }),
            EmbeddingStrategy::fallback_only(64),
            GeocodingServiceConfig::default().with_lookup_timeout(Duration::from_millis(50)),
        )
    }

    #[tokio::test]
    async fn test_geocode_timeout_is_miss_and_not_stored() {
        let cache = cache();
        let service = slow_service(cache.clone());

        let result = service.resolve_address("Pune Station").await.unwrap();

        assert!(result.is_none());
        assert_eq!(cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reverse_timeout_is_miss_and_not_stored() {
        let cache = cache();
        let service = slow_service(cache.clone());

        let result = service.resolve_coordinates(18.5285, 73.8741).await.unwrap();

        assert!(result.is_none());
        assert_eq!(cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_autocomplete_timeout_is_empty() {
        let service = slow_service(cache());

        let suggestions = service.autocomplete("Pune").await.unwrap();

        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_provider_miss_is_not_stored() {
        let mut geo = MockGeoProvider::new();
        geo.expect_geocode().times(2).returning(|_| Ok(None));
        geo.expect_provider_name().return_const("mock");
        let cache = cache();
        let service = service(geo, cache.clone());

        assert!(service.resolve_address("Atlantis").await.unwrap().is_none());
        assert!(service.resolve_address("Atlantis").await.unwrap().is_none());
        assert_eq!(cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_provider_error_is_miss() {
        let mut geo = MockGeoProvider::new();
        geo.expect_geocode()
            .returning(|_| Err(DomainError::provider("mock", "HTTP 503")));
        geo.expect_provider_name().return_const("mock");
        let cache = cache();
        let service = service(geo, cache.clone());

        let result = service.resolve_address("Pune Station").await.unwrap();

        assert!(result.is_none());
        assert_eq!(cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_address_is_validation_error() {
        let service = service(MockGeoProvider::new(), cache());

        let blank = service.resolve_address("   ").await;
        let symbols = service.resolve_address("!!! ,,,").await;

        assert!(matches!(blank, Err(DomainError::Validation { .. })));
        assert!(matches!(symbols, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_reverse_hit_within_radius() {
        let mut geo = MockGeoProvider::new();
        geo.expect_reverse_geocode()
            .times(1)
            .returning(|_| Ok(Some(pune_station())));
        geo.expect_provider_name().return_const("mock");
        let service = service(geo, cache());

        let first = service.resolve_coordinates(18.5285, 73.8741).await.unwrap().unwrap();
        // ~60 m north of the stored point
        let second = service.resolve_coordinates(18.5290, 73.8741).await.unwrap().unwrap();

        assert_eq!(first.source, ResultSource::Provider);
        assert_eq!(second.source, ResultSource::Cache);
        assert_eq!(second.display_name, "Pune Railway Station, Pune, Maharashtra");
    }

    #[tokio::test]
    async fn test_reverse_result_serves_forward_lookup() {
        let mut geo = MockGeoProvider::new();
        geo.expect_reverse_geocode()
            .returning(|_| Ok(Some(pune_station())));
        geo.expect_provider_name().return_const("mock");
        let service = service(geo, cache());

        service.resolve_coordinates(18.5285, 73.8741).await.unwrap();
        let forward = service
            .resolve_address("Pune Railway Station, Pune, Maharashtra")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(forward.source, ResultSource::Cache);
    }

    #[tokio::test]
    async fn test_invalid_coordinates_rejected() {
        let service = service(MockGeoProvider::new(), cache());

        let result = service.resolve_coordinates(91.0, 0.0).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_autocomplete_passthrough_and_limit() {
        let mut geo = MockGeoProvider::new();
        geo.expect_autocomplete()
            .withf(|query, limit| query == "Pune" && *limit == 5)
            .returning(|_, _| {
                Ok((0..8)
                    .map(|i| AddressSuggestion {
                        display_name: format!("Pune {}", i),
                        address: StructuredAddress::default(),
                    })
                    .collect())
            });
        geo.expect_provider_name().return_const("mock");
        let cache = cache();
        let service = service(geo, cache.clone());

        let suggestions = service.autocomplete(" Pune ").await.unwrap();

        assert_eq!(suggestions.len(), 5);
        assert_eq!(cache.size().await.unwrap(), 0);
        assert!(service.autocomplete("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_resets_cache() {
        let mut geo = MockGeoProvider::new();
        geo.expect_geocode()
            .returning(|_| Ok(Some(pune_station())));
        geo.expect_provider_name().return_const("mock");
        let service = service(geo, cache());

        service.resolve_address("Pune Station").await.unwrap();
        service.clear().await.unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn test_resolved_location_serialization() {
        let resolved = ResolvedLocation::from_provider(pune_station());
        let json = serde_json::to_value(&resolved).unwrap();

        assert_eq!(json["source"], "provider");
        assert!(json.get("similarity").is_none());
        assert_eq!(json["address"]["city"], "Pune");
    }
}
