//! Geo cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the semantic address cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoCacheConfig {
    /// Maximum number of entries kept before FIFO eviction
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Time-to-live for cached entries in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Cosine similarity a stored entry must exceed to count as a candidate (0.0 to 1.0)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Maximum distance between a candidate and the current best match, in meters
    #[serde(default = "default_distance_threshold_meters")]
    pub distance_threshold_meters: f64,
}

fn default_max_entries() -> usize {
    1000
}

fn default_ttl_secs() -> u64 {
    86_400
}

fn default_similarity_threshold() -> f32 {
    0.85
}

fn default_distance_threshold_meters() -> f64 {
    500.0
}

impl Default for GeoCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
            similarity_threshold: default_similarity_threshold(),
            distance_threshold_meters: default_distance_threshold_meters(),
        }
    }
}

impl GeoCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get TTL as Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Set the maximum number of entries (at least one)
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max.max(1);
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    /// Set the similarity threshold
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the distance threshold in meters
    pub fn with_distance_threshold(mut self, meters: f64) -> Self {
        self.distance_threshold_meters = meters.max(0.0);
        self
    }

    /// Clamp values loaded from configuration sources into their valid ranges
    pub fn sanitized(self) -> Self {
        let max_entries = self.max_entries;
        let similarity = self.similarity_threshold;
        let distance = self.distance_threshold_meters;

        self.with_max_entries(max_entries)
            .with_similarity_threshold(similarity)
            .with_distance_threshold(distance)
    }
}
