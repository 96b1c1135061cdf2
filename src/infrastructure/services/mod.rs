//! Infrastructure services

mod geocoding_service;

pub use geocoding_service::{
    GeocodingService, GeocodingServiceConfig, GeocodingServiceTrait, ResolvedLocation,
    ResultSource,
};
