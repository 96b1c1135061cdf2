//! Domain layer - Core geocoding cache logic and entities

pub mod embedding;
pub mod error;
pub mod geo;
pub mod geo_cache;

pub use error::DomainError;
