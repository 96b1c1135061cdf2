//! Geo provider implementations

mod nominatim;

pub use nominatim::NominatimGeoProvider;
