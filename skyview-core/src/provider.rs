use crate::{
    Config, Coordinates, WeatherSnapshot,
    config::Platform,
    error::FetchError,
    provider::{synthetic::SyntheticFetcher, weatherapi::WeatherApiFetcher},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod synthetic;
pub mod weatherapi;

/// Source of weather snapshots for a point on Earth.
///
/// Implementations never panic across this boundary: every failure comes
/// back as a [`FetchError`].
#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    async fn fetch(&self, coords: Coordinates) -> Result<WeatherSnapshot, FetchError>;

    /// `false` for generated demo data.
    fn is_live(&self) -> bool;
}

/// Pick the fetcher the configuration asks for.
///
/// No API key, or a platform without keyed network access, selects the
/// synthetic source. That is a supported mode, not an error.
pub fn fetcher_from_config(config: &Config) -> Arc<dyn WeatherFetcher> {
    fetcher_for(config, config.effective_api_key())
}

fn fetcher_for(config: &Config, api_key: Option<String>) -> Arc<dyn WeatherFetcher> {
    match (config.platform, api_key) {
        (Platform::Native, Some(key)) => {
            let fetcher = match &config.base_url {
                Some(base) => WeatherApiFetcher::with_base_url(key, base.clone()),
                None => WeatherApiFetcher::new(key),
            };
            tracing::info!("Using WeatherAPI forecasts");
            Arc::new(fetcher)
        }
        (platform, _) => {
            tracing::info!(?platform, "No live weather source configured, using synthetic data");
            Arc::new(SyntheticFetcher::new())
        }
    }
}
