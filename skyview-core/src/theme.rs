//! Display theme derived from the current condition and the local hour.
//!
//! The mapping goes condition + hour -> [`ThemeKey`] -> [`Theme`] table entry.
//! All four entries currently share one palette; new palettes only need a new
//! table row.

use serde::Serialize;

use crate::model::WeatherSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKey {
    Sunny,
    Cloudy,
    Rainy,
    Night,
}

impl ThemeKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeKey::Sunny => "sunny",
            ThemeKey::Cloudy => "cloudy",
            ThemeKey::Rainy => "rainy",
            ThemeKey::Night => "night",
        }
    }

    pub const fn all() -> &'static [ThemeKey] {
        &[ThemeKey::Sunny, ThemeKey::Cloudy, ThemeKey::Rainy, ThemeKey::Night]
    }
}

impl std::fmt::Display for ThemeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of color tokens, as `#RRGGBB` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub primary_color: &'static str,
    pub secondary_color: &'static str,
    pub background_color: &'static str,
    pub card_color: &'static str,
    pub text_color: &'static str,
    pub inactive_color: &'static str,
}

/// Used until the first snapshot arrives.
pub const DEFAULT_THEME: Theme = Theme {
    primary_color: "#FF3B30",
    secondary_color: "#8E8E93",
    background_color: "#1C1C1E",
    card_color: "#2C2C2E",
    text_color: "#FFFFFF",
    inactive_color: "#636366",
};

const SUNNY: Theme = DEFAULT_THEME;
const CLOUDY: Theme = DEFAULT_THEME;
const RAINY: Theme = DEFAULT_THEME;
const NIGHT: Theme = DEFAULT_THEME;

const RAIN_WORDS: &[&str] = &["rain", "drizzle", "thunder"];
const CLOUD_WORDS: &[&str] = &["cloud", "overcast", "fog", "mist"];

impl Theme {
    pub fn for_key(key: ThemeKey) -> Theme {
        match key {
            ThemeKey::Sunny => SUNNY,
            ThemeKey::Cloudy => CLOUDY,
            ThemeKey::Rainy => RAINY,
            ThemeKey::Night => NIGHT,
        }
    }
}

/// Night covers 19:00 through 05:59.
pub fn is_night(hour: u32) -> bool {
    hour >= 19 || hour <= 5
}

/// Classify a free-text condition at a given local hour (0-23).
///
/// Unknown conditions fall through to night or sunny.
pub fn theme_key(condition: &str, hour: u32) -> ThemeKey {
    let condition = condition.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| condition.contains(w));

    if mentions(RAIN_WORDS) {
        ThemeKey::Rainy
    } else if mentions(CLOUD_WORDS) {
        ThemeKey::Cloudy
    } else if is_night(hour) {
        ThemeKey::Night
    } else {
        ThemeKey::Sunny
    }
}

/// Theme for an optional snapshot; `None` yields [`DEFAULT_THEME`].
pub fn theme_for(snapshot: Option<&WeatherSnapshot>, hour: u32) -> Theme {
    snapshot
        .map(|s| Theme::for_key(theme_key(&s.current.condition, hour)))
        .unwrap_or(DEFAULT_THEME)
}
