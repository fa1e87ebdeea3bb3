use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use crate::{
    error::FetchError,
    model::{
        Coordinates, CurrentConditions, DAILY_ENTRIES, DailyForecast, HOURLY_ENTRIES,
        HourlyForecast, LocationInfo, WeatherSnapshot, temperature_pair,
    },
};

use super::WeatherFetcher;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";
const FORECAST_PATH: &str = "/v1/forecast.json";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone)]
pub struct WeatherApiFetcher {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiFetcher {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {e}");
                Client::new()
            });

        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    async fn fetch_forecast(&self, coords: Coordinates) -> Result<WeatherSnapshot, FetchError> {
        let url = format!("{}{}", self.base_url, FORECAST_PATH);
        let query = coords.as_query();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query.as_str()),
                ("days", "7"),
                ("aqi", "yes"),
                ("alerts", "yes"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: WaForecastResponse = serde_json::from_str(&body)?;
        normalize(parsed)
    }
}

#[async_trait]
impl WeatherFetcher for WeatherApiFetcher {
    async fn fetch(&self, coords: Coordinates) -> Result<WeatherSnapshot, FetchError> {
        tracing::info!(%coords, "fetching forecast from WeatherAPI");
        let result = self.fetch_forecast(coords).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "WeatherAPI forecast failed");
        }
        result
    }

    fn is_live(&self) -> bool {
        true
    }
}

// Upstream payload. Every field defaults, whether it is missing or `null`,
// so partial payloads still normalize.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaLocation {
    #[serde(deserialize_with = "null_as_default")]
    name: String,
    #[serde(deserialize_with = "null_as_default")]
    region: String,
    #[serde(deserialize_with = "null_as_default")]
    country: String,
    #[serde(deserialize_with = "null_as_default")]
    lat: f64,
    #[serde(deserialize_with = "null_as_default")]
    lon: f64,
    #[serde(deserialize_with = "null_as_default")]
    localtime: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaCondition {
    #[serde(deserialize_with = "null_as_default")]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaCurrent {
    temp_c: Option<f64>,
    temp_f: Option<f64>,
    feelslike_c: Option<f64>,
    feelslike_f: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    condition: WaCondition,
    #[serde(deserialize_with = "null_as_default")]
    humidity: f64,
    #[serde(deserialize_with = "null_as_default")]
    wind_kph: f64,
    #[serde(deserialize_with = "null_as_default")]
    wind_dir: String,
    #[serde(deserialize_with = "null_as_default")]
    uv: f64,
    #[serde(deserialize_with = "null_as_default")]
    precip_mm: f64,
    #[serde(deserialize_with = "null_as_default")]
    pressure_mb: f64,
    #[serde(deserialize_with = "null_as_default")]
    vis_km: f64,
    #[serde(deserialize_with = "null_as_default")]
    last_updated: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaHour {
    #[serde(deserialize_with = "null_as_default")]
    time: String,
    temp_c: Option<f64>,
    temp_f: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    condition: WaCondition,
    #[serde(deserialize_with = "null_as_default")]
    chance_of_rain: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaDay {
    maxtemp_c: Option<f64>,
    maxtemp_f: Option<f64>,
    mintemp_c: Option<f64>,
    mintemp_f: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    avghumidity: f64,
    #[serde(deserialize_with = "null_as_default")]
    daily_chance_of_rain: f64,
    #[serde(deserialize_with = "null_as_default")]
    condition: WaCondition,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaAstro {
    #[serde(deserialize_with = "null_as_default")]
    sunrise: String,
    #[serde(deserialize_with = "null_as_default")]
    sunset: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaForecastDay {
    #[serde(deserialize_with = "null_as_default")]
    date: String,
    #[serde(deserialize_with = "null_as_default")]
    day: WaDay,
    #[serde(deserialize_with = "null_as_default")]
    astro: WaAstro,
    #[serde(deserialize_with = "null_as_default")]
    hour: Vec<WaHour>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaForecast {
    #[serde(deserialize_with = "null_as_default")]
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaForecastResponse {
    #[serde(deserialize_with = "null_as_default")]
    location: WaLocation,
    #[serde(deserialize_with = "null_as_default")]
    current: WaCurrent,
    #[serde(deserialize_with = "null_as_default")]
    forecast: WaForecast,
}

/// Normalize a raw WeatherAPI JSON body into a snapshot.
pub fn normalize_json(body: &str) -> Result<WeatherSnapshot, FetchError> {
    let parsed: WaForecastResponse = serde_json::from_str(body)?;
    normalize(parsed)
}

fn normalize(parsed: WaForecastResponse) -> Result<WeatherSnapshot, FetchError> {
    let WaForecastResponse { location, current, forecast } = parsed;
    let days = forecast.forecastday;

    if days.len() < DAILY_ENTRIES {
        return Err(FetchError::Malformed(format!(
            "expected {DAILY_ENTRIES} forecast days, got {} \
             (the API key's plan may cap forecast days)",
            days.len()
        )));
    }

    let hourly = hourly_from(&days, &location.localtime);
    if hourly.len() < HOURLY_ENTRIES {
        return Err(FetchError::Malformed(format!(
            "expected {HOURLY_ENTRIES} hourly entries from {:?}, got {}",
            location.localtime,
            hourly.len()
        )));
    }

    let (sunrise, sunset) = days
        .first()
        .map(|d| (d.astro.sunrise.clone(), d.astro.sunset.clone()))
        .unwrap_or_default();

    let (temperature, temp_f) = temperature_pair(current.temp_c, current.temp_f);
    let (feels_like, feels_like_f) = temperature_pair(current.feelslike_c, current.feelslike_f);

    let current = CurrentConditions {
        temperature,
        temp_f,
        condition: current.condition.text,
        humidity: percent(current.humidity),
        wind_speed: current.wind_kph,
        wind_direction: current.wind_dir,
        uv_index: current.uv,
        precipitation: current.precip_mm,
        feels_like,
        feels_like_f,
        pressure: current.pressure_mb,
        visibility: current.vis_km,
        sunrise,
        sunset,
        last_updated: current.last_updated,
    };

    let daily = days.into_iter().take(DAILY_ENTRIES).map(daily_from).collect();

    Ok(WeatherSnapshot {
        location: LocationInfo {
            name: location.name,
            region: location.region,
            country: location.country,
            lat: location.lat,
            lon: location.lon,
            localtime: location.localtime,
        },
        current,
        hourly,
        daily,
    })
}

/// 24 hours starting at the hour of `localtime`, spanning day boundaries.
///
/// `localtime` comes unpadded (`2024-05-01 9:05`) while hour entries are
/// padded (`2024-05-01 09:00`), so both are parsed before comparing.
fn hourly_from(days: &[WaForecastDay], localtime: &str) -> Vec<HourlyForecast> {
    let now = parse_hour(localtime);

    days.iter()
        .flat_map(|d| d.hour.iter())
        .skip_while(|h| match now {
            Some(now) => parse_hour(&h.time).is_none_or(|t| t < now),
            None => false,
        })
        .take(HOURLY_ENTRIES)
        .map(|h| {
            let (temperature, temp_f) = temperature_pair(h.temp_c, h.temp_f);
            HourlyForecast {
                time: h.time.split_once(' ').map(|(_, t)| t).unwrap_or(&h.time).to_string(),
                temperature,
                temp_f,
                condition: h.condition.text.clone(),
                chance_of_rain: percent(h.chance_of_rain),
            }
        })
        .collect()
}

fn daily_from(day: WaForecastDay) -> DailyForecast {
    let (max_temp, max_temp_f) = temperature_pair(day.day.maxtemp_c, day.day.maxtemp_f);
    let (min_temp, min_temp_f) = temperature_pair(day.day.mintemp_c, day.day.mintemp_f);
    let weekday = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d")
        .map(|d| d.format("%A").to_string())
        .unwrap_or_default();

    DailyForecast {
        date: day.date,
        day: weekday,
        max_temp,
        max_temp_f,
        min_temp,
        min_temp_f,
        condition: day.day.condition.text,
        chance_of_rain: percent(day.day.daily_chance_of_rain),
        humidity: percent(day.day.avghumidity),
        sunrise: day.astro.sunrise,
        sunset: day.astro.sunset,
    }
}

/// Parse an upstream `YYYY-MM-DD H:MM` stamp, truncated to the hour.
/// The hour may or may not be zero-padded.
fn parse_hour(stamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(stamp.trim(), STAMP_FORMAT)
        .ok()
        .and_then(|t| t.with_minute(0))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn hours_for(date: &str) -> Vec<Value> {
        (0..24)
            .map(|h| {
                let rain = if h == 15 { 35 } else { 0 };
                json!({
                    "time": format!("{date} {h:02}:00"),
                    "temp_c": 10.0 + h as f64,
                    "temp_f": 50.0 + h as f64,
                    "condition": { "text": "Clear" },
                    "chance_of_rain": rain,
                })
            })
            .collect()
    }

    fn payload(localtime: &str) -> Value {
        let days: Vec<Value> = (1..=7)
            .map(|d| {
                let date = format!("2024-05-{d:02}");
                let hours = hours_for(&date);
                json!({
                    "date": date,
                    "day": {
                        "maxtemp_c": 30.0 + d as f64,
                        "maxtemp_f": 86.0 + d as f64,
                        "mintemp_c": 20.0,
                        "mintemp_f": 68.0,
                        "avghumidity": 60.4,
                        "daily_chance_of_rain": 80,
                        "condition": { "text": "Patchy rain nearby" }
                    },
                    "astro": { "sunrise": "05:58 AM", "sunset": "07:10 PM" },
                    "hour": hours,
                })
            })
            .collect();

        json!({
            "location": {
                "name": "Ahmedabad",
                "region": "Gujarat",
                "country": "India",
                "lat": 23.03,
                "lon": 72.58,
                "localtime": localtime,
            },
            "current": {
                "temp_c": 31.3,
                "temp_f": 88.3,
                "feelslike_c": 33.1,
                "feelslike_f": 91.6,
                "condition": { "text": "Sunny" },
                "humidity": 40,
                "wind_kph": 14.4,
                "wind_dir": "WNW",
                "uv": 8.0,
                "precip_mm": 0.1,
                "pressure_mb": 1006.0,
                "vis_km": 6.0,
                "last_updated": "2024-05-01 14:00",
                "air_quality": { "pm2_5": 40.2 }
            },
            "forecast": { "forecastday": days },
            "alerts": { "alert": [] }
        })
    }

    fn normalize_value(value: Value) -> Result<WeatherSnapshot, FetchError> {
        normalize_json(&value.to_string())
    }

    #[test]
    fn keeps_both_temperature_units_exactly() {
        let snap = normalize_value(payload("2024-05-01 14:05")).unwrap();
        assert_eq!(snap.current.temperature, 31.3);
        assert_eq!(snap.current.temp_f, 88.3);
        assert_eq!(snap.current.feels_like, 33.1);
        assert_eq!(snap.current.feels_like_f, 91.6);
        assert_eq!(snap.daily[0].max_temp, 31.0);
        assert_eq!(snap.daily[0].max_temp_f, 87.0);
    }

    #[test]
    fn derives_fahrenheit_when_only_celsius_is_given() {
        let mut value = payload("2024-05-01 14:05");
        value["current"].as_object_mut().unwrap().remove("temp_f");
        let snap = normalize_value(value).unwrap();
        assert_eq!(snap.current.temperature, 31.3);
        assert_eq!(snap.current.temp_f, (31.3_f64 * 9.0 / 5.0 + 32.0).round());
    }

    #[test]
    fn derives_celsius_when_only_fahrenheit_is_given() {
        let mut value = payload("2024-05-01 14:05");
        value["current"].as_object_mut().unwrap().remove("temp_c");
        let snap = normalize_value(value).unwrap();
        assert_eq!(snap.current.temp_f, 88.3);
        assert_eq!(snap.current.temperature, 31.0);
    }

    #[test]
    fn hourly_starts_at_local_hour_and_crosses_midnight() {
        let snap = normalize_value(payload("2024-05-01 14:05")).unwrap();
        assert_eq!(snap.hourly.len(), HOURLY_ENTRIES);
        assert_eq!(snap.hourly[0].time, "14:00");
        assert_eq!(snap.hourly[0].temperature, 24.0);
        assert_eq!(snap.hourly[1].chance_of_rain, 35);
        assert_eq!(snap.hourly[10].time, "00:00");
        assert_eq!(snap.hourly[23].time, "13:00");
    }

    #[test]
    fn hourly_starts_at_unpadded_morning_localtime() {
        let snap = normalize_value(payload("2024-05-01 9:05")).unwrap();
        assert_eq!(snap.hourly.len(), HOURLY_ENTRIES);
        assert_eq!(snap.hourly[0].time, "09:00");
        assert_eq!(snap.hourly[0].temperature, 19.0);
        assert_eq!(snap.hourly[14].time, "23:00");
        assert_eq!(snap.hourly[15].time, "00:00");
        assert_eq!(snap.hourly[23].time, "08:00");
    }

    #[test]
    fn hourly_starts_at_midnight_localtime() {
        let snap = normalize_value(payload("2024-05-01 0:41")).unwrap();
        assert_eq!(snap.hourly[0].time, "00:00");
        assert_eq!(snap.hourly[0].temperature, 10.0);
        assert_eq!(snap.hourly[23].time, "23:00");
    }

    #[test]
    fn parse_hour_accepts_padded_and_unpadded_hours() {
        let padded = parse_hour("2024-05-01 09:00").unwrap();
        assert_eq!(parse_hour("2024-05-01 9:59"), Some(padded));
        assert!(parse_hour("2024-05-01 10:00").unwrap() > padded);
        assert_eq!(parse_hour("soon"), None);
    }

    #[test]
    fn daily_has_weekdays_and_rounded_percentages() {
        let snap = normalize_value(payload("2024-05-01 09:00")).unwrap();
        assert_eq!(snap.daily.len(), DAILY_ENTRIES);
        assert_eq!(snap.daily[0].date, "2024-05-01");
        assert_eq!(snap.daily[0].day, "Wednesday");
        assert_eq!(snap.daily[0].humidity, 60);
        assert_eq!(snap.daily[0].chance_of_rain, 80);
        assert_eq!(snap.current.sunrise, "05:58 AM");
        assert_eq!(snap.current.sunset, "07:10 PM");
        assert_eq!(snap.location.name, "Ahmedabad");
    }

    #[test]
    fn missing_fields_default_instead_of_failing() {
        let mut value = payload("2024-05-01 00:00");
        value.as_object_mut().unwrap().remove("location");
        value["current"] = json!({});
        let snap = normalize_value(value).unwrap();

        assert_eq!(snap.location.name, "");
        assert_eq!(snap.current.temperature, 0.0);
        assert_eq!(snap.current.temp_f, 0.0);
        assert_eq!(snap.current.condition, "");
        assert_eq!(snap.current.humidity, 0);
        // no localtime: hourly starts at the first upstream hour
        assert_eq!(snap.hourly[0].time, "00:00");
    }

    #[test]
    fn null_fields_default_instead_of_failing() {
        let mut value = payload("2024-05-01 14:05");
        value["current"]["wind_dir"] = Value::Null;
        value["current"]["humidity"] = Value::Null;
        value["current"]["condition"] = Value::Null;
        value["location"]["name"] = Value::Null;
        value["forecast"]["forecastday"][0]["astro"] = Value::Null;
        value["forecast"]["forecastday"][1]["day"]["avghumidity"] = Value::Null;
        let snap = normalize_value(value).unwrap();

        assert_eq!(snap.current.wind_direction, "");
        assert_eq!(snap.current.humidity, 0);
        assert_eq!(snap.current.condition, "");
        assert_eq!(snap.current.temperature, 31.3);
        assert_eq!(snap.current.sunrise, "");
        assert_eq!(snap.location.name, "");
        assert_eq!(snap.daily[1].humidity, 0);
        assert_eq!(snap.daily[1].max_temp, 32.0);
        assert_eq!(snap.hourly[0].time, "14:00");
    }

    #[test]
    fn too_few_days_is_malformed() {
        let mut value = payload("2024-05-01 14:00");
        value["forecast"]["forecastday"].as_array_mut().unwrap().truncate(3);
        let err = normalize_value(value).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(ref m) if m.contains("got 3")));
        assert!(err.to_string().contains("plan may cap forecast days"));
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(normalize_json("not json"), Err(FetchError::Malformed(_))));
        assert!(matches!(
            normalize_json(r#"{"current": {"temp_c": "hot"}}"#),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "x".repeat(300);
        let out = truncate_body(&long);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(percent(-3.0), 0);
        assert_eq!(percent(140.0), 100);
        assert_eq!(percent(59.5), 60);
    }
}
