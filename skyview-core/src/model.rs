use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// `lat,lon` form accepted by most forecast APIs as a query.
    pub fn as_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Reverse-geocoded place for a set of coordinates. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.city.is_none()
            && self.region.is_none()
            && self.country.is_none()
            && self.postal_code.is_none()
    }

    /// Short label such as "Seattle, Washington".
    pub fn label(&self) -> Option<String> {
        let place = self
            .city
            .as_deref()
            .or(self.region.as_deref())
            .or(self.country.as_deref())?;

        let suffix = self
            .region
            .as_deref()
            .filter(|r| *r != place)
            .or_else(|| self.country.as_deref().filter(|c| *c != place));

        Some(match suffix {
            Some(s) => format!("{place}, {s}"),
            None => place.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub localtime: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub temperature: f64,
    pub temp_f: f64,
    pub condition: String,
    pub humidity: u8,
    /// km/h
    pub wind_speed: f64,
    pub wind_direction: String,
    pub uv_index: f64,
    /// mm
    pub precipitation: f64,
    pub feels_like: f64,
    pub feels_like_f: f64,
    /// mb
    pub pressure: f64,
    /// km
    pub visibility: f64,
    pub sunrise: String,
    pub sunset: String,
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecast {
    /// Wall-clock label, e.g. "14:00".
    pub time: String,
    pub temperature: f64,
    pub temp_f: f64,
    pub condition: String,
    pub chance_of_rain: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    /// ISO date, e.g. "2024-05-01".
    pub date: String,
    /// Weekday name, e.g. "Wednesday".
    pub day: String,
    pub max_temp: f64,
    pub max_temp_f: f64,
    pub min_temp: f64,
    pub min_temp_f: f64,
    pub condition: String,
    pub chance_of_rain: u8,
    pub humidity: u8,
    pub sunrise: String,
    pub sunset: String,
}

/// One complete weather reading. Always replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub location: LocationInfo,
    pub current: CurrentConditions,
    /// Exactly [`HOURLY_ENTRIES`] entries starting at the current hour.
    pub hourly: Vec<HourlyForecast>,
    /// Exactly [`DAILY_ENTRIES`] entries starting today.
    pub daily: Vec<DailyForecast>,
}

pub const HOURLY_ENTRIES: usize = 24;
pub const DAILY_ENTRIES: usize = 7;

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

/// Fill in a Celsius/Fahrenheit pair from whichever side is known.
///
/// Values that are present are kept as-is; a missing side is derived and
/// rounded to a whole degree. If neither is known both are 0.
pub fn temperature_pair(celsius: Option<f64>, fahrenheit: Option<f64>) -> (f64, f64) {
    match (celsius, fahrenheit) {
        (Some(c), Some(f)) => (c, f),
        (Some(c), None) => (c, celsius_to_fahrenheit(c).round()),
        (None, Some(f)) => (fahrenheit_to_celsius(f).round(), f),
        (None, None) => (0.0, 0.0),
    }
}
