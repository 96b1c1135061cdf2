//! Geo cache trait and types

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CacheEntry;
use crate::domain::geo::Coordinates;
use crate::domain::DomainError;

/// Result of a forward (semantic) match
#[derive(Debug, Clone)]
pub struct SimilarMatch {
    /// The matching cached entry
    pub entry: Arc<CacheEntry>,
    /// Cosine similarity between the query and the entry
    pub similarity: f32,
}

impl SimilarMatch {
    pub fn new(entry: Arc<CacheEntry>, similarity: f32) -> Self {
        Self { entry, similarity }
    }
}

/// Statistics for the geo cache
///
/// `hits`/`misses` count only exact keyed lookups; the linear-scan matchers
/// report through `match_hits`/`match_misses`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoCacheStats {
    /// Live entries in the ordered sequence
    pub entries: usize,
    /// Keys held by the keyed timed store
    pub keys: u64,
    /// Keyed lookups that found an entry
    pub hits: u64,
    /// Keyed lookups that found nothing
    pub misses: u64,
    /// Forward or reverse scans that found an entry
    pub match_hits: u64,
    /// Forward or reverse scans that found nothing
    pub match_misses: u64,
    /// Entries removed by FIFO eviction
    pub evictions: u64,
}

impl GeoCacheStats {
    /// Share of resolutions answered from the cache
    ///
    /// A keyed miss always falls through to a scan, so a resolution is either
    /// a keyed hit or exactly one scan. Keyed misses are not counted again.
    pub fn hit_rate(&self) -> f32 {
        let hits = self.hits + self.match_hits;
        let total = hits + self.match_misses;

        if total == 0 {
            return 0.0;
        }

        hits as f32 / total as f32
    }
}

/// Bounded store of resolved addresses with semantic and proximity matching
#[async_trait]
pub trait GeoCache: Send + Sync + Debug {
    /// Best semantic match for a normalized query and its embedding
    async fn find_similar(
        &self,
        normalized_query: &str,
        embedding: &[f32],
    ) -> Result<Option<SimilarMatch>, DomainError>;

    /// First live entry strictly within `radius_meters` of `coordinates`
    async fn find_nearby(
        &self,
        coordinates: Coordinates,
        radius_meters: f64,
    ) -> Result<Option<Arc<CacheEntry>>, DomainError>;

    /// Exact lookup by normalized key
    async fn get(&self, normalized_key: &str) -> Result<Option<Arc<CacheEntry>>, DomainError>;

    /// Insert an entry, evicting the oldest one when over capacity
    async fn store(&self, entry: CacheEntry) -> Result<(), DomainError>;

    /// Drop every entry and reset counters
    async fn clear(&self) -> Result<(), DomainError>;

    /// Get cache statistics
    async fn stats(&self) -> Result<GeoCacheStats, DomainError>;

    /// Number of live entries
    async fn size(&self) -> Result<usize, DomainError>;

    /// Remove expired entries from the ordered sequence
    async fn cleanup_expired(&self) -> Result<usize, DomainError>;
}
