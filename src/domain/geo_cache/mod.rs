//! Semantic geo cache domain models and traits
//!
//! Matches incoming addresses against previously resolved ones by embedding
//! similarity, and coordinates by proximity, instead of by exact key.

mod config;
mod entry;
mod matching;
mod repository;

pub use config::GeoCacheConfig;
pub use entry::CacheEntry;
pub use matching::{find_first_within, select_best_match, MatchPolicy};
pub use repository::{GeoCache, GeoCacheStats, SimilarMatch};
