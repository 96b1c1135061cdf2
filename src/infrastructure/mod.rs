//! Infrastructure layer - External service implementations

pub mod embedding;
pub mod geo_cache;
pub mod geocoding;
pub mod http_client;
pub mod logging;
pub mod observability;
pub mod services;
