//! Reverse geocoding: convert coordinates to a structured address.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    error::LocationError,
    model::{Address, Coordinates},
};

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("skyview/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    road: Option<String>,
    house_number: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
    postcode: Option<String>,
}

impl From<NominatimAddress> for Address {
    fn from(addr: NominatimAddress) -> Self {
        let street = match (addr.house_number, addr.road) {
            (Some(n), Some(r)) => Some(format!("{n} {r}")),
            (_, road) => road,
        };

        // Prefer city > town > village > municipality for the place name
        let city = addr.city.or(addr.town).or(addr.village).or(addr.municipality);

        Address {
            street,
            city,
            region: addr.state.or(addr.county),
            country: addr.country,
            postal_code: addr.postcode,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self, LocationError> {
        Self::with_base_url(NOMINATIM_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LocationError::Geocode(format!("failed to create client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up the address at `coords`. `Ok(None)` means the lookup worked
    /// but found nothing.
    pub async fn reverse(&self, coords: Coordinates) -> Result<Option<Address>, LocationError> {
        let url = format!("{}/reverse", self.base_url);
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "json"),
                ("addressdetails", "1"),
            ])
            .send()
            .await
            .map_err(|e| LocationError::Geocode(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocationError::Geocode(format!(
                "reverse geocode returned status {}",
                response.status()
            )));
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Geocode(format!("parse error: {e}")))?;

        let address = body.address.map(Address::from).filter(|a| !a.is_empty());
        if let Some(label) = address.as_ref().and_then(Address::label) {
            tracing::info!("Reverse geocoded to: {}", label);
        }
        Ok(address)
    }
}
