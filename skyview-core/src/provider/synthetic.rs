//! Deterministic demo data used when no live forecast source is configured.

use std::f64::consts::PI;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, TimeDelta, Timelike};

use crate::{
    error::FetchError,
    model::{
        Coordinates, CurrentConditions, DAILY_ENTRIES, DailyForecast, HOURLY_ENTRIES,
        HourlyForecast, LocationInfo, WeatherSnapshot, celsius_to_fahrenheit,
    },
};

use super::WeatherFetcher;

/// Coordinates the demo data describes.
pub const DEMO_COORDINATES: Coordinates = Coordinates::new(23.03, 72.587);

const SUNRISE: &str = "06:05 AM";
const SUNSET: &str = "07:16 PM";

const DAILY_CONDITIONS: [&str; 7] = [
    "Sunny",
    "Partly cloudy",
    "Cloudy",
    "Light rain",
    "Moderate rain",
    "Sunny",
    "Clear",
];

#[derive(Debug, Clone, Default)]
pub struct SyntheticFetcher;

impl SyntheticFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WeatherFetcher for SyntheticFetcher {
    async fn fetch(&self, coords: Coordinates) -> Result<WeatherSnapshot, FetchError> {
        tracing::debug!(%coords, "serving synthetic weather");
        Ok(synthetic_snapshot(coords, Local::now().naive_local()))
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Raw hourly curve: 28 ± 8 °C over one day.
pub fn hourly_temperature(offset: usize) -> f64 {
    28.0 + 8.0 * (offset as f64 / 24.0 * PI * 2.0).sin()
}

/// Raw daily maximum: 30 + 5·sin over the week.
pub fn daily_max_temperature(offset: usize) -> f64 {
    30.0 + 5.0 * (offset as f64 / 7.0 * PI).sin()
}

/// Raw daily minimum: 22 + 3·sin over the week.
pub fn daily_min_temperature(offset: usize) -> f64 {
    22.0 + 3.0 * (offset as f64 / 7.0 * PI).sin()
}

fn hourly_condition(hour: u32) -> &'static str {
    match hour {
        0..=5 => "Clear",
        6..=11 => "Sunny",
        12..=17 => "Partly cloudy",
        _ => "Clear",
    }
}

fn hourly_chance_of_rain(hour: u32) -> u8 {
    if (16..20).contains(&hour) { 30 } else { 0 }
}

fn daily_chance_of_rain(offset: usize) -> u8 {
    match offset % 7 {
        3 => 40,
        4 => 80,
        _ => 0,
    }
}

/// Build the demo snapshot for `coords` as seen at local wall-clock `now`.
pub fn synthetic_snapshot(coords: Coordinates, now: NaiveDateTime) -> WeatherSnapshot {
    let stamp = now.format("%Y-%m-%d %H:%M").to_string();

    let hourly = (0..HOURLY_ENTRIES)
        .map(|i| {
            let hour = (now.hour() + i as u32) % 24;
            let raw = hourly_temperature(i);
            HourlyForecast {
                time: format!("{hour:02}:00"),
                temperature: raw.round(),
                temp_f: celsius_to_fahrenheit(raw).round(),
                condition: hourly_condition(hour).to_string(),
                chance_of_rain: hourly_chance_of_rain(hour),
            }
        })
        .collect();

    let daily = (0..DAILY_ENTRIES)
        .map(|i| {
            let date = now.date() + TimeDelta::days(i as i64);
            let max = daily_max_temperature(i);
            let min = daily_min_temperature(i);
            DailyForecast {
                date: date.format("%Y-%m-%d").to_string(),
                day: date.format("%A").to_string(),
                max_temp: max.round(),
                max_temp_f: celsius_to_fahrenheit(max).round(),
                min_temp: min.round(),
                min_temp_f: celsius_to_fahrenheit(min).round(),
                condition: DAILY_CONDITIONS[i % 7].to_string(),
                chance_of_rain: daily_chance_of_rain(i),
                humidity: 45 + (i as u8) * 5,
                sunrise: SUNRISE.to_string(),
                sunset: SUNSET.to_string(),
            }
        })
        .collect();

    WeatherSnapshot {
        location: LocationInfo {
            name: "Ahmedabad".to_string(),
            region: "Gujarat".to_string(),
            country: "India".to_string(),
            lat: coords.latitude,
            lon: coords.longitude,
            localtime: stamp.clone(),
        },
        current: CurrentConditions {
            temperature: 32.0,
            temp_f: 89.6,
            condition: "Partly Sunny".to_string(),
            humidity: 45,
            wind_speed: 12.0,
            wind_direction: "NE".to_string(),
            uv_index: 7.0,
            precipitation: 0.0,
            feels_like: 34.0,
            feels_like_f: 93.2,
            pressure: 1013.0,
            visibility: 10.0,
            sunrise: SUNRISE.to_string(),
            sunset: SUNSET.to_string(),
            last_updated: stamp,
        },
        hourly,
        daily,
    }
}
