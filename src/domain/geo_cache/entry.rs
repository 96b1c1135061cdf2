//! Cached geocoding result

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::geo::{normalize_address, Coordinates, GeoLocation, StructuredAddress};

/// A resolved address held by the geo cache
///
/// Entries are immutable once built; the cache shares them behind `Arc` and
/// replaces rather than updates them.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    id: Uuid,
    raw_address: String,
    normalized_key: String,
    coordinates: Coordinates,
    address: StructuredAddress,
    display_name: String,
    embedding: Vec<f32>,
    inserted_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Build an entry for `raw_address` from a provider result and its embedding
    pub fn new(raw_address: impl Into<String>, location: GeoLocation, embedding: Vec<f32>) -> Self {
        let raw_address = raw_address.into();
        let normalized_key = normalize_address(&raw_address);

        Self {
            id: Uuid::new_v4(),
            raw_address,
            normalized_key,
            coordinates: location.coordinates,
            address: location.address,
            display_name: location.display_name,
            embedding,
            inserted_at: Utc::now(),
        }
    }

    /// Override the insertion timestamp
    pub fn with_inserted_at(mut self, inserted_at: DateTime<Utc>) -> Self {
        self.inserted_at = inserted_at;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn raw_address(&self) -> &str {
        &self.raw_address
    }

    pub fn normalized_key(&self) -> &str {
        &self.normalized_key
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn address(&self) -> &StructuredAddress {
        &self.address
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    /// Check whether the entry is older than `ttl`
    pub fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now()
            .signed_duration_since(self.inserted_at)
            .to_std()
            .map(|age| age >= ttl)
            .unwrap_or(false)
    }
}
