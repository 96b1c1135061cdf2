//! Geo provider trait definition

use async_trait::async_trait;

use super::{AddressSuggestion, Coordinates, GeoLocation};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Trait for external geocoding backends (Nominatim, Google, etc.)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GeoProvider: Send + Sync + std::fmt::Debug {
    /// Resolve a free-form address to a location
    async fn geocode(&self, address: &str) -> Result<Option<GeoLocation>, DomainError>;

    /// Resolve coordinates to the nearest known address
    async fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> Result<Option<GeoLocation>, DomainError>;

    /// Suggest addresses for a partial query, at most `limit` results
    async fn autocomplete(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AddressSuggestion>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
