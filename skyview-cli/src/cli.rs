use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use skyview_core::{
    Config, Coordinates, LocationProvider, PermissionStatus, Platform, RefreshPhase,
    WeatherStore, fetcher_from_config, geocode::NominatimGeocoder, location::FixedLocationService,
};

use crate::output;

/// Live refreshes need a full week of forecast days.
const API_KEY_HELP: &str =
    "The key's plan must allow 7-day forecasts; shorter plans fail every live refresh";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyview", version, about = "Location-aware weather viewer")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the WeatherAPI.com key and default coordinates.
    Configure,

    /// Fetch the weather once and print it.
    Show {
        #[command(flatten)]
        target: Target,

        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Keep refreshing and print every update until Ctrl-C.
    Watch {
        #[command(flatten)]
        target: Target,
    },
}

/// Where to read the weather for.
#[derive(Debug, Args)]
pub struct Target {
    /// Latitude; overrides the configured location.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude; overrides the configured location.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Behave like a platform without location support (demo data).
    #[arg(long)]
    pub web: bool,
}

impl Target {
    fn apply(&self, config: &mut Config) {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            config.set_location(Coordinates::new(lat, lon));
        }
        if self.web {
            config.platform = Platform::Web;
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { target, json } => {
                let mut config = Config::load()?;
                target.apply(&mut config);
                show(&config, json).await
            }
            Command::Watch { target } => {
                let mut config = Config::load()?;
                target.apply(&mut config);
                watch(&config).await
            }
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let key = inquire::Password::new("WeatherAPI.com key (blank for demo data):")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .with_help_message(API_KEY_HELP)
        .prompt()?;
    config.set_api_key(key);

    let set_location = inquire::Confirm::new("Set default coordinates?")
        .with_default(config.location.is_none())
        .prompt()?;
    if set_location {
        let current = config.coordinates();
        let mut lat = inquire::CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number");
        let mut lon = inquire::CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number");
        if let Some(c) = current {
            lat = lat.with_default(c.latitude);
            lon = lon.with_default(c.longitude);
        }
        let coords = Coordinates::new(lat.prompt()?, lon.prompt()?);
        if !(-90.0..=90.0).contains(&coords.latitude)
            || !(-180.0..=180.0).contains(&coords.longitude)
        {
            bail!("Coordinates out of range: {coords}");
        }
        config.set_location(coords);
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    if config.api_key.is_none() {
        println!("No API key set; synthetic demo data will be shown.");
    }
    Ok(())
}

fn pipeline(config: &Config) -> Result<(LocationProvider, WeatherStore)> {
    let mut service = FixedLocationService::new(config.coordinates());
    if config.reverse_geocode {
        let geocoder = NominatimGeocoder::new().context("Failed to set up reverse geocoding")?;
        service = service.with_geocoder(geocoder);
    }

    let interval = config.refresh_interval();
    let provider = LocationProvider::with_interval(Arc::new(service), config.platform, interval);
    let store = WeatherStore::with_options(
        fetcher_from_config(config),
        provider.subscribe(),
        config.platform,
        interval,
    );
    Ok((provider, store))
}

async fn show(config: &Config, json: bool) -> Result<()> {
    let (provider, store) = pipeline(config)?;

    if config.platform.has_location() {
        if provider.request_permission().await? == PermissionStatus::Denied {
            bail!("Permission to access location was denied");
        }
        provider
            .refresh_location()
            .await
            .context("Could not determine location; pass --lat/--lon or run `skyview configure`")?;
        store.refresh().await?;
    } else {
        // Only seeds the demo snapshot here; no loop is spawned.
        store.start();
    }

    let state = store.state();
    let Some(snapshot) = state.snapshot.as_ref() else {
        bail!("No weather data available");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
    } else {
        print!(
            "{}",
            output::render(&provider.state(), snapshot, store.theme_key())
        );
    }
    Ok(())
}

async fn watch(config: &Config) -> Result<()> {
    let (provider, store) = pipeline(config)?;
    let mut updates = store.subscribe();
    let mut fixes = provider.subscribe();
    let mut last_location_error: Option<String> = None;

    let location_task = provider.start();
    let weather_task = store.start();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = fixes.changed() => {
                if changed.is_err() {
                    break;
                }
                let fix = fixes.borrow_and_update().clone();
                match fix.error {
                    Some(message) => {
                        if last_location_error.as_ref() != Some(&message) {
                            eprintln!("location: {message}");
                        }
                        last_location_error = Some(message);
                    }
                    None if !fix.loading => last_location_error = None,
                    None => {}
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                match state.phase() {
                    RefreshPhase::Ready => {
                        if let Some(snapshot) = state.snapshot.as_ref() {
                            print!("{}", output::summary(snapshot, store.theme_key()));
                        }
                    }
                    RefreshPhase::Failed => {
                        if let Some(error) = state.error.as_deref() {
                            eprintln!("{}", output::failure(error, state.snapshot.as_ref()));
                        }
                    }
                    RefreshPhase::Idle | RefreshPhase::Loading => {}
                }
            }
        }
    }

    tracing::info!("Shutting down");
    provider.dispose();
    store.dispose();
    location_task.shutdown().await;
    weather_task.shutdown().await;
    Ok(())
}
