//! OpenStreetMap Nominatim geo provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::geo::{
    AddressSuggestion, Coordinates, GeoLocation, GeoProvider, StructuredAddress,
};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim-backed forward/reverse geocoding and search suggestions
#[derive(Debug)]
pub struct NominatimGeoProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
    user_agent: String,
}

impl<C: HttpClientTrait> NominatimGeoProvider<C> {
    /// Create a provider against the public Nominatim instance
    pub fn new(client: C, user_agent: impl Into<String>) -> Self {
        Self::with_base_url(client, user_agent, DEFAULT_NOMINATIM_BASE_URL)
    }

    /// Create a provider with a custom base URL (self-hosted Nominatim)
    pub fn with_base_url(
        client: C,
        user_agent: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    fn reverse_url(&self) -> String {
        format!("{}/reverse", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("User-Agent", self.user_agent.as_str()),
            ("Accept", "application/json"),
        ]
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<NominatimPlace>, DomainError> {
        let limit = limit.to_string();
        let params = [
            ("q", query),
            ("format", "jsonv2"),
            ("addressdetails", "1"),
            ("limit", limit.as_str()),
        ];

        let json = self
            .client
            .get_json(&self.search_url(), self.headers(), &params)
            .await?;

        serde_json::from_value(json).map_err(|e| {
            DomainError::provider("nominatim", format!("Failed to parse search response: {}", e))
        })
    }
}

#[async_trait]
impl<C: HttpClientTrait> GeoProvider for NominatimGeoProvider<C> {
    async fn geocode(&self, address: &str) -> Result<Option<GeoLocation>, DomainError> {
        let places = self.search(address, 1).await?;

        places
            .into_iter()
            .next()
            .map(NominatimPlace::into_location)
            .transpose()
    }

    async fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> Result<Option<GeoLocation>, DomainError> {
        let lat = coordinates.lat().to_string();
        let lon = coordinates.lng().to_string();
        let params = [
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("format", "jsonv2"),
            ("addressdetails", "1"),
        ];

        let json = self
            .client
            .get_json(&self.reverse_url(), self.headers(), &params)
            .await?;

        // Nominatim answers 200 with {"error": "..."} when nothing is near
        if json.get("error").is_some() {
            return Ok(None);
        }

        let place: NominatimPlace = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("nominatim", format!("Failed to parse reverse response: {}", e))
        })?;

        place.into_location().map(Some)
    }

    async fn autocomplete(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AddressSuggestion>, DomainError> {
        let places = self.search(query, limit).await?;

        Ok(places
            .into_iter()
            .take(limit)
            .map(|place| AddressSuggestion {
                address: place.address.into_structured(),
                display_name: place.display_name,
            })
            .collect())
    }

    fn provider_name(&self) -> &'static str {
        "nominatim"
    }
}

// Nominatim API types

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    address: NominatimAddress,
}

impl NominatimPlace {
    fn into_location(self) -> Result<GeoLocation, DomainError> {
        let lat = parse_degrees(&self.lat, "lat")?;
        let lng = parse_degrees(&self.lon, "lon")?;
        let coordinates = Coordinates::new(lat, lng)
            .map_err(|e| DomainError::provider("nominatim", e.to_string()))?;

        Ok(GeoLocation::new(coordinates, self.display_name)
            .with_address(self.address.into_structured()))
    }
}

fn parse_degrees(value: &str, field: &str) -> Result<f64, DomainError> {
    value.parse().map_err(|_| {
        DomainError::provider("nominatim", format!("Invalid {} value '{}'", field, value))
    })
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    house_number: Option<String>,
    building: Option<String>,
    road: Option<String>,
    suburb: Option<String>,
    neighbourhood: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    fn into_structured(self) -> StructuredAddress {
        StructuredAddress {
            building: self.building.or(self.house_number),
            street: self.road,
            area: self.suburb.or(self.neighbourhood),
            city: self.city.or(self.town).or(self.village),
            state: self.state,
            postal_code: self.postcode,
            country: self.country,
        }
    }
}
