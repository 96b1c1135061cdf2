//! Forward and reverse match selection over cached entries

use std::sync::Arc;

use super::{CacheEntry, GeoCacheConfig, SimilarMatch};
use crate::domain::embedding::cosine_similarity;
use crate::domain::geo::Coordinates;

/// Thresholds applied by the forward matcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    /// Similarity a candidate must strictly exceed
    pub similarity_threshold: f32,
    /// A later candidate must lie strictly closer than this to the current best
    pub distance_threshold_meters: f64,
}

impl MatchPolicy {
    pub fn new(similarity_threshold: f32, distance_threshold_meters: f64) -> Self {
        Self {
            similarity_threshold,
            distance_threshold_meters,
        }
    }
}

impl From<&GeoCacheConfig> for MatchPolicy {
    fn from(config: &GeoCacheConfig) -> Self {
        Self::new(config.similarity_threshold, config.distance_threshold_meters)
    }
}

/// Pick the best semantic match for `query` among `entries`, in scan order
///
/// The first entry above the similarity threshold is taken as the provisional
/// best. A later candidate replaces it only when it is both more similar and
/// within the distance threshold of the *current best* (not of the query,
/// whose location is unknown here). Candidates therefore cluster around the
/// first strong match; a chain of replacements can still drift away from it.
pub fn select_best_match<'a, I>(
    entries: I,
    query: &[f32],
    policy: &MatchPolicy,
) -> Option<SimilarMatch>
where
    I: IntoIterator<Item = &'a Arc<CacheEntry>>,
{
    let mut best: Option<(&Arc<CacheEntry>, f32)> = None;

    for entry in entries {
        let similarity = cosine_similarity(query, entry.embedding());

        if similarity <= policy.similarity_threshold {
            continue;
        }

        best = match best {
            None => Some((entry, similarity)),
            Some((current, best_similarity)) => {
                let distance = entry.coordinates().distance_to(&current.coordinates());

                if similarity > best_similarity && distance < policy.distance_threshold_meters {
                    Some((entry, similarity))
                } else {
                    Some((current, best_similarity))
                }
            }
        };
    }

    best.map(|(entry, similarity)| SimilarMatch::new(Arc::clone(entry), similarity))
}

/// First entry, in scan order, strictly closer than `radius_meters` to `point`
pub fn find_first_within<'a, I>(
    entries: I,
    point: &Coordinates,
    radius_meters: f64,
) -> Option<&'a Arc<CacheEntry>>
where
    I: IntoIterator<Item = &'a Arc<CacheEntry>>,
{
    entries
        .into_iter()
        .find(|entry| entry.coordinates().distance_to(point) < radius_meters)
}
