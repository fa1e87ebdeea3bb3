//! Error types surfaced by the location and weather components.

/// User-facing message for any failed weather refresh.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch weather data. Please try again later.";

/// User-facing message when a weather refresh is asked for without a fix.
pub const LOCATION_NOT_AVAILABLE: &str = "Location not available";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Permission to access location was denied")]
    PermissionDenied,
    /// The platform has no location capability. Not retried.
    #[error("Location unavailable on this platform")]
    Unavailable,
    /// Transient; the next scheduled refresh tries again.
    #[error("Failed to get location information: {0}")]
    AcquisitionFailed(String),
    /// Reverse lookup failed. Never fatal, the address is just left empty.
    #[error("Reverse geocoding failed: {0}")]
    Geocode(String),
}

impl LocationError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LocationError::Unavailable)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("weather request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("weather API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed weather response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

impl FetchError {
    /// The single message shown to users for every kind of fetch failure.
    pub fn user_message(&self) -> &'static str {
        FETCH_FAILED_MESSAGE
    }
}

/// Why a weather refresh did not publish a new snapshot.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("Location not available")]
    NoLocation,
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// A newer refresh was issued while this one was in flight.
    #[error("superseded by a newer refresh")]
    Superseded,
    #[error("store has been disposed")]
    Disposed,
}
