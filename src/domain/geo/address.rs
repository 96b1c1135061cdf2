//! Structured address and provider result types

use serde::{Deserialize, Serialize};

use super::Coordinates;

/// Address broken into optional components
///
/// Every field is optional; a missing component means the provider did not
/// report it, not that the address is invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl StructuredAddress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_street(mut self, street: impl Into<String>) -> Self {
        self.street = Some(street.into());
        self
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// True when no component is known
    pub fn is_empty(&self) -> bool {
        self.building.is_none()
            && self.street.is_none()
            && self.area.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
    }
}

/// A resolved location as returned by a geo provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub coordinates: Coordinates,
    pub display_name: String,
    #[serde(default)]
    pub address: StructuredAddress,
}

impl GeoLocation {
    pub fn new(coordinates: Coordinates, display_name: impl Into<String>) -> Self {
        Self {
            coordinates,
            display_name: display_name.into(),
            address: StructuredAddress::default(),
        }
    }

    pub fn with_address(mut self, address: StructuredAddress) -> Self {
        self.address = address;
        self
    }
}

/// Autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressSuggestion {
    pub display_name: String,
    #[serde(default)]
    pub address: StructuredAddress,
}
