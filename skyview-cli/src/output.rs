//! Plain-text rendering of weather snapshots.

use std::fmt;

use skyview_core::{LocationState, ThemeKey, WeatherSnapshot};

/// Full report: place, current conditions, next hours and the week.
pub fn render(
    location: &LocationState,
    snapshot: &WeatherSnapshot,
    theme: Option<ThemeKey>,
) -> String {
    Report { location, snapshot, theme }.to_string()
}

struct Report<'a> {
    location: &'a LocationState,
    snapshot: &'a WeatherSnapshot,
    theme: Option<ThemeKey>,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot;
        let cur = &snapshot.current;

        writeln!(f, "{}", place(self.location, snapshot))?;
        if !snapshot.location.localtime.is_empty() {
            writeln!(f, "Local time: {}", snapshot.location.localtime)?;
        }
        writeln!(
            f,
            "\n{}  {:.1}°C / {:.1}°F  (feels like {:.1}°C / {:.1}°F)",
            cur.condition, cur.temperature, cur.temp_f, cur.feels_like, cur.feels_like_f
        )?;
        writeln!(
            f,
            "Humidity {}%  Wind {:.0} km/h {}  UV {:.0}",
            cur.humidity, cur.wind_speed, cur.wind_direction, cur.uv_index
        )?;
        writeln!(
            f,
            "Precipitation {:.1} mm  Pressure {:.0} mb  Visibility {:.0} km",
            cur.precipitation, cur.pressure, cur.visibility
        )?;
        writeln!(f, "Sunrise {}  Sunset {}", cur.sunrise, cur.sunset)?;

        writeln!(f, "\nNext 24 hours:")?;
        for hour in &snapshot.hourly {
            writeln!(
                f,
                "  {:>5}  {:>5.1}°C  {:<16} rain {:>3}%",
                hour.time, hour.temperature, hour.condition, hour.chance_of_rain
            )?;
        }

        writeln!(f, "\n7-day forecast:")?;
        for day in &snapshot.daily {
            writeln!(
                f,
                "  {:<9} {}  {:>5.1}° / {:>5.1}°C  {:<16} rain {:>3}%  humidity {:>3}%",
                day.day,
                day.date,
                day.max_temp,
                day.min_temp,
                day.condition,
                day.chance_of_rain,
                day.humidity
            )?;
        }

        if let Some(key) = self.theme {
            writeln!(f, "\nTheme: {key}")?;
        }
        Ok(())
    }
}

/// One line per update, used by `watch`.
pub fn summary(snapshot: &WeatherSnapshot, theme: Option<ThemeKey>) -> String {
    let cur = &snapshot.current;
    let theme = theme.map(|k| k.as_str()).unwrap_or("-");
    format!(
        "[{}] {}: {:.1}°C / {:.1}°F, {} (theme {theme})\n",
        chrono::Local::now().format("%H:%M:%S"),
        snapshot.location.name,
        cur.temperature,
        cur.temp_f,
        cur.condition,
    )
}

pub fn failure(error: &str, last: Option<&WeatherSnapshot>) -> String {
    match last {
        Some(snap) => format!(
            "{error} (still showing {} as of {})",
            snap.location.name, snap.current.last_updated
        ),
        None => error.to_string(),
    }
}

/// Prefer the reverse-geocoded address; fall back to what the forecast says.
fn place(location: &LocationState, snapshot: &WeatherSnapshot) -> String {
    if let Some(label) = location.address.as_ref().and_then(|a| a.label()) {
        return label;
    }
    let info = &snapshot.location;
    [info.name.as_str(), info.region.as_str(), info.country.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyview_core::{Address, provider::synthetic::synthetic_snapshot};

    fn demo() -> WeatherSnapshot {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        synthetic_snapshot(skyview_core::provider::synthetic::DEMO_COORDINATES, now)
    }

    #[test]
    fn render_uses_forecast_place_without_address() {
        let out = render(&LocationState::default(), &demo(), Some(ThemeKey::Sunny));
        assert!(out.starts_with("Ahmedabad, Gujarat, India\n"));
        assert!(out.contains("32.0°C / 89.6°F"));
        assert!(out.contains("Next 24 hours:"));
        assert!(out.contains("Wednesday"));
        assert!(out.ends_with("Theme: sunny\n"));
    }

    #[test]
    fn render_prefers_geocoded_address() {
        let location = LocationState {
            address: Some(Address {
                city: Some("Gandhinagar".into()),
                region: Some("Gujarat".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = render(&location, &demo(), None);
        assert!(out.starts_with("Gandhinagar, Gujarat\n"));
        assert!(!out.contains("Theme:"));
    }

    #[test]
    fn render_lists_every_hour_and_day() {
        let out = render(&LocationState::default(), &demo(), None);
        let hour_rows = out.lines().filter(|l| l.contains("°C  ") && l.contains("rain")).count();
        let day_rows = out.lines().filter(|l| l.contains("humidity")).count();
        assert_eq!(hour_rows, 24 + 7);
        assert_eq!(day_rows, 7);
        assert!(out.find("Next 24 hours:") < out.find("7-day forecast:"));
        assert!(out.contains("  10:00"));
    }

    #[test]
    fn failure_mentions_stale_snapshot() {
        let snap = demo();
        assert_eq!(failure("boom", None), "boom");
        assert!(failure("boom", Some(&snap)).contains("still showing Ahmedabad"));
    }

    #[test]
    fn summary_is_one_line() {
        let line = summary(&demo(), Some(ThemeKey::Cloudy));
        assert_eq!(line.lines().count(), 1);
        assert!(line.contains("theme cloudy"));
    }
}
