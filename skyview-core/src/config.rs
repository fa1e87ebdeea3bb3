use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::Coordinates;

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Runtime environment the pipeline is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Native,
    /// No device location and no keyed network access; demo data only.
    Web,
}

impl Platform {
    pub fn has_location(&self) -> bool {
        matches!(self, Platform::Native)
    }
}

/// Fixed coordinates stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<LocationConfig> for Coordinates {
    fn from(cfg: LocationConfig) -> Self {
        Coordinates::new(cfg.latitude, cfg.longitude)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// refresh_interval_secs = 60
///
/// [location]
/// latitude = 23.03
/// longitude = 72.587
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// WeatherAPI.com key. Absent means synthetic data.
    pub api_key: Option<String>,

    /// Override for the forecast API host, mostly for tests.
    pub base_url: Option<String>,

    pub platform: Platform,

    pub refresh_interval_secs: u64,

    pub reverse_geocode: bool,

    /// Must stay the last field; it serializes as a trailing `[location]` table.
    pub location: Option<LocationConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            platform: Platform::default(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            reverse_geocode: true,
            location: None,
        }
    }
}

impl Config {
    /// Read the config file. A missing file yields [`Config::default`].
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        Ok(cfg)
    }

    /// Write the config file, creating its directory on first save.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// `<platform config dir>/skyview/config.toml`
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skyview", "skyview")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Store an API key; blank input clears it.
    pub fn set_api_key(&mut self, api_key: String) {
        let trimmed = api_key.trim();
        self.api_key = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
    }

    pub fn set_location(&mut self, coords: Coordinates) {
        self.location = Some(LocationConfig {
            latitude: coords.latitude,
            longitude: coords.longitude,
        });
    }

    /// API key from the environment, falling back to the config file.
    pub fn effective_api_key(&self) -> Option<String> {
        pick_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location.map(Coordinates::from)
    }
}

fn pick_api_key(env: Option<String>, configured: Option<&str>) -> Option<String> {
    env.filter(|k| !k.trim().is_empty())
        .or_else(|| configured.filter(|k| !k.trim().is_empty()).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_key_and_sixty_second_interval() {
        let cfg = Config::default();
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.platform, Platform::Native);
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(60));
        assert!(cfg.reverse_geocode);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = Config::from_toml(
            r#"
            platform = "web"

            [location]
            latitude = 23.03
            longitude = 72.587
            "#,
        )
        .expect("valid config");

        assert_eq!(cfg.platform, Platform::Web);
        assert_eq!(cfg.refresh_interval_secs, DEFAULT_REFRESH_INTERVAL_SECS);
        assert_eq!(cfg.coordinates(), Some(Coordinates::new(23.03, 72.587)));
    }

    #[test]
    fn toml_roundtrip_keeps_fields() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.set_location(Coordinates::new(1.5, -2.5));

        let text = toml::to_string_pretty(&cfg).expect("serializable");
        let parsed = Config::from_toml(&text).expect("parsable");

        assert_eq!(parsed.api_key.as_deref(), Some("KEY"));
        assert_eq!(parsed.coordinates(), Some(Coordinates::new(1.5, -2.5)));
    }

    #[test]
    fn blank_api_key_clears_it() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.set_api_key("   ".into());
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn environment_key_overrides_config() {
        assert_eq!(pick_api_key(Some("ENV".into()), Some("CFG")).as_deref(), Some("ENV"));
        assert_eq!(pick_api_key(None, Some("CFG")).as_deref(), Some("CFG"));
        assert_eq!(pick_api_key(Some("".into()), Some("CFG")).as_deref(), Some("CFG"));
        assert_eq!(pick_api_key(None, Some("")), None);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let cfg = Config { refresh_interval_secs: 0, ..Config::default() };
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn web_platform_has_no_location() {
        assert!(!Platform::Web.has_location());
        assert!(Platform::Native.has_location());
    }
}
