//! HTTP API request and response types

pub mod error;
pub mod extract;
pub mod geocode;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use extract::{Json, Query};
pub use geocode::{
    AutocompleteParams, AutocompleteResponse, CacheStatsResponse, CleanupResponse,
    GeocodeRequest, ReverseGeocodeRequest,
};
