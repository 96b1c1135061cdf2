//! In-memory geo cache implementation

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use moka::sync::Cache as MokaCache;
use tracing::debug;

use crate::domain::geo::Coordinates;
use crate::domain::geo_cache::{
    find_first_within, select_best_match, CacheEntry, GeoCache, GeoCacheConfig, GeoCacheStats,
    MatchPolicy, SimilarMatch,
};
use crate::domain::DomainError;

/// Insertion-ordered entries guarded by the cache lock
#[derive(Debug, Default)]
struct OrderedEntries {
    entries: VecDeque<Arc<CacheEntry>>,
    /// Embedding length fixed by the first insertion since the last clear
    dimensions: Option<usize>,
}

/// In-memory geo cache using linear scans
///
/// One mutex guards the ordered sequence for every scan and mutation, so a
/// lookup costs O(n) in the number of entries; with capacities around a
/// thousand entries that is well below the cost of a provider round trip.
/// A moka cache keyed by normalized address mirrors the sequence for exact
/// lookups and expires keys on its own after the TTL.
#[derive(Debug)]
pub struct InMemoryGeoCache {
    ordered: Mutex<OrderedEntries>,
    keyed: MokaCache<String, Arc<CacheEntry>>,
    config: GeoCacheConfig,
    policy: MatchPolicy,
    hits: AtomicU64,
    misses: AtomicU64,
    match_hits: AtomicU64,
    match_misses: AtomicU64,
    evictions: AtomicU64,
}

impl InMemoryGeoCache {
    /// Create a cache holding at most `max_entries` with default thresholds
    pub fn new(max_entries: usize) -> Self {
        Self::with_config(GeoCacheConfig::default().with_max_entries(max_entries))
    }

    /// Create a cache from a full configuration
    pub fn with_config(config: GeoCacheConfig) -> Self {
        let keyed = MokaCache::builder().time_to_live(config.ttl()).build();

        Self {
            ordered: Mutex::new(OrderedEntries::default()),
            keyed,
            policy: MatchPolicy::from(&config),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            match_hits: AtomicU64::new(0),
            match_misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &GeoCacheConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, OrderedEntries>, DomainError> {
        self.ordered
            .lock()
            .map_err(|e| DomainError::internal(format!("Failed to acquire cache lock: {}", e)))
    }

    fn is_live(&self, entry: &CacheEntry) -> bool {
        !entry.is_expired(self.config.ttl())
    }

    /// Drop the keyed mapping for `entry` unless a newer duplicate owns the key
    fn forget_key(&self, entry: &CacheEntry) {
        let owned_by_entry = self
            .keyed
            .get(entry.normalized_key())
            .is_some_and(|current| current.id() == entry.id());

        if owned_by_entry {
            self.keyed.invalidate(entry.normalized_key());
        }
    }

    fn record_match(&self, found: bool) {
        if found {
            self.match_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.match_misses.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl GeoCache for InMemoryGeoCache {
    async fn find_similar(
        &self,
        normalized_query: &str,
        embedding: &[f32],
    ) -> Result<Option<SimilarMatch>, DomainError> {
        let result = {
            let ordered = self.lock()?;
            let live = ordered.entries.iter().filter(|entry| self.is_live(entry));
            select_best_match(live, embedding, &self.policy)
        };

        self.record_match(result.is_some());

        match &result {
            Some(found) => debug!(
                query = %normalized_query,
                matched = %found.entry.normalized_key(),
                similarity = found.similarity,
                "Semantic match"
            ),
            None => debug!(query = %normalized_query, "No semantic match"),
        }

        Ok(result)
    }

    async fn find_nearby(
        &self,
        coordinates: Coordinates,
        radius_meters: f64,
    ) -> Result<Option<Arc<CacheEntry>>, DomainError> {
        let result = {
            let ordered = self.lock()?;
            let live = ordered.entries.iter().filter(|entry| self.is_live(entry));
            find_first_within(live, &coordinates, radius_meters).cloned()
        };

        self.record_match(result.is_some());
        debug!(%coordinates, radius_meters, found = result.is_some(), "Proximity lookup");

        Ok(result)
    }

    async fn get(&self, normalized_key: &str) -> Result<Option<Arc<CacheEntry>>, DomainError> {
        let entry = match self.keyed.get(normalized_key) {
            Some(entry) if self.is_live(&entry) => Some(entry),
            Some(_) => {
                self.keyed.invalidate(normalized_key);
                None
            }
            None => None,
        };

        if entry.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }

        Ok(entry)
    }

    async fn store(&self, entry: CacheEntry) -> Result<(), DomainError> {
        let dimensions = entry.embedding().len();

        if dimensions == 0 {
            return Err(DomainError::validation("Cannot cache an entry with an empty embedding"));
        }

        let entry = Arc::new(entry);
        let mut ordered = self.lock()?;

        match ordered.dimensions {
            Some(expected) if expected != dimensions => {
                return Err(DomainError::cache(format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    expected, dimensions
                )));
            }
            Some(_) => {}
            None => ordered.dimensions = Some(dimensions),
        }

        ordered.entries.push_back(Arc::clone(&entry));
        self.keyed
            .insert(entry.normalized_key().to_string(), Arc::clone(&entry));

        while ordered.entries.len() > self.config.max_entries {
            if let Some(evicted) = ordered.entries.pop_front() {
                self.forget_key(&evicted);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %evicted.normalized_key(), "Evicted oldest cache entry");
            }
        }

        Ok(())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        let mut ordered = self.lock()?;

        ordered.entries.clear();
        ordered.dimensions = None;
        self.keyed.invalidate_all();
        self.keyed.run_pending_tasks();

        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.match_hits.store(0, Ordering::Relaxed);
        self.match_misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);

        Ok(())
    }

    async fn stats(&self) -> Result<GeoCacheStats, DomainError> {
        let entries = {
            let ordered = self.lock()?;
            ordered.entries.iter().filter(|entry| self.is_live(entry)).count()
        };

        self.keyed.run_pending_tasks();

        Ok(GeoCacheStats {
            entries,
            keys: self.keyed.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            match_hits: self.match_hits.load(Ordering::Relaxed),
            match_misses: self.match_misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        })
    }

    async fn size(&self) -> Result<usize, DomainError> {
        let ordered = self.lock()?;

        Ok(ordered.entries.iter().filter(|entry| self.is_live(entry)).count())
    }

    async fn cleanup_expired(&self) -> Result<usize, DomainError> {
        let mut ordered = self.lock()?;

        let (live, expired): (VecDeque<_>, VecDeque<_>) = ordered
            .entries
            .drain(..)
            .partition(|entry| self.is_live(entry));

        ordered.entries = live;

        for entry in &expired {
            self.forget_key(entry);
        }

        Ok(expired.len())
    }
}
