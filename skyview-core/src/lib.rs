//! Core library for the `skyview` weather viewer.
//!
//! This crate defines:
//! - Device location acquisition with a periodic refresh loop
//! - Weather fetchers (live WeatherAPI.com or deterministic demo data)
//! - The weather store that follows location fixes and derives the theme
//! - Configuration, shared domain models and error types
//!
//! State lives in `tokio::sync::watch` channels; views subscribe and re-render
//! on change.

pub mod config;
pub mod error;
pub mod geocode;
pub mod location;
pub mod model;
pub mod provider;
pub mod store;
pub mod task;
pub mod theme;

pub use config::{Config, Platform};
pub use error::{FetchError, LocationError, RefreshError};
pub use location::{LocationProvider, LocationService, LocationState, PermissionStatus};
pub use model::{Address, Coordinates, WeatherSnapshot};
pub use provider::{WeatherFetcher, fetcher_from_config};
pub use store::{RefreshPhase, WeatherState, WeatherStore};
pub use task::TaskHandle;
pub use theme::{Theme, ThemeKey};
