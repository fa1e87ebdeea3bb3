use async_trait::async_trait;

use crate::{
    error::LocationError,
    geocode::NominatimGeocoder,
    model::{Address, Coordinates},
};

use super::{LocationService, PermissionStatus};

/// Device stand-in for hosts without a positioning API: reports a fixed
/// position and resolves addresses through Nominatim.
#[derive(Debug, Clone)]
pub struct FixedLocationService {
    position: Option<Coordinates>,
    geocoder: Option<NominatimGeocoder>,
}

impl FixedLocationService {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position, geocoder: None }
    }

    pub fn with_geocoder(mut self, geocoder: NominatimGeocoder) -> Self {
        self.geocoder = Some(geocoder);
        self
    }
}

#[async_trait]
impl LocationService for FixedLocationService {
    async fn permission_status(&self) -> Result<PermissionStatus, LocationError> {
        Ok(PermissionStatus::Granted)
    }

    async fn request_permission(&self) -> Result<PermissionStatus, LocationError> {
        Ok(PermissionStatus::Granted)
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        self.position.ok_or_else(|| {
            LocationError::AcquisitionFailed("no position configured".to_string())
        })
    }

    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Vec<Address>, LocationError> {
        match &self.geocoder {
            Some(geocoder) => Ok(geocoder.reverse(coords).await?.into_iter().collect()),
            None => Ok(Vec::new()),
        }
    }
}
