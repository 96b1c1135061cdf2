//! Geographic domain models and the geo provider trait

mod address;
mod coordinates;
mod normalize;
mod provider;

pub use address::{AddressSuggestion, GeoLocation, StructuredAddress};
pub use coordinates::{great_circle_distance_meters, Coordinates, EARTH_RADIUS_METERS};
pub use normalize::normalize_address;
pub use provider::GeoProvider;

#[cfg(test)]
pub use provider::MockGeoProvider;
