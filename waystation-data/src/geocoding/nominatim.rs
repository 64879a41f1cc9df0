//! Nominatim reverse-geocoding response types.
//!
//! Only the fields the geocoder reads are modelled; everything else in the
//! payload is ignored.
//!
//! See: <https://nominatim.org/release-docs/latest/api/Reverse/>

use serde::Deserialize;
use waystation_core::Address;

/// Body of a `/reverse?format=json&addressdetails=1` response.
#[derive(Debug, Deserialize)]
pub struct ReverseResponse {
    /// Full formatted address.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Structured address components.
    #[serde(default)]
    pub address: AddressDetails,

    /// Set instead of an address when nothing was found at the point.
    #[serde(default)]
    pub error: Option<String>,
}

/// Structured address components reported by Nominatim.
#[derive(Debug, Default, Deserialize)]
pub struct AddressDetails {
    /// City name.
    pub city: Option<String>,
    /// Town name, used when `city` is absent.
    pub town: Option<String>,
    /// Country name.
    pub country: Option<String>,
}

impl From<ReverseResponse> for Address {
    /// Smaller settlements report a `town` rather than a `city`.
    fn from(response: ReverseResponse) -> Self {
        let AddressDetails {
            city,
            town,
            country,
        } = response.address;
        Self {
            address: response.display_name.unwrap_or_default(),
            city: city.or(town),
            country,
        }
    }
}
