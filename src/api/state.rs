//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::services::GeocodingServiceTrait;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub geocoding_service: Arc<dyn GeocodingServiceTrait>,
}

impl AppState {
    pub fn new(geocoding_service: Arc<dyn GeocodingServiceTrait>) -> Self {
        Self { geocoding_service }
    }
}
