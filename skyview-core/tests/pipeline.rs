//! End-to-end: fixed device position through the location provider into the
//! weather store, using synthetic data.

use std::{sync::Arc, time::Duration};

use skyview_core::{
    Coordinates, LocationProvider, Platform, RefreshPhase, WeatherStore,
    location::FixedLocationService, provider::synthetic::SyntheticFetcher,
};

const AHMEDABAD: Coordinates = Coordinates::new(23.03, 72.587);

fn pipeline(position: Option<Coordinates>, platform: Platform) -> (LocationProvider, WeatherStore) {
    let service = Arc::new(FixedLocationService::new(position));
    let provider = LocationProvider::with_interval(service, platform, Duration::from_secs(60));
    let store = WeatherStore::with_options(
        Arc::new(SyntheticFetcher::new()),
        provider.subscribe(),
        platform,
        Duration::from_secs(60),
    );
    (provider, store)
}

#[tokio::test(start_paused = true)]
async fn test_fix_flows_into_weather() {
    let (provider, store) = pipeline(Some(AHMEDABAD), Platform::Native);

    let location_task = provider.start();
    let weather_task = store.start();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let fix = provider.state();
    assert_eq!(fix.coordinates, Some(AHMEDABAD));
    assert_eq!(fix.readings, 1);
    assert!(fix.error.is_none());

    let state = store.state();
    assert_eq!(state.phase(), RefreshPhase::Ready);
    let snap = state.snapshot.expect("snapshot");
    assert_eq!(snap.location.name, "Ahmedabad");
    assert_eq!(snap.location.lat, 23.03);
    assert_eq!(snap.current.temperature, 32.0);
    assert_eq!(snap.hourly.len(), 24);
    assert_eq!(snap.daily.len(), 7);
    assert!(store.theme_key().is_some());

    // the next location tick produces a second fix
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(provider.state().readings, 2);

    location_task.shutdown().await;
    weather_task.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_missing_position_leaves_weather_idle() {
    let (provider, store) = pipeline(None, Platform::Native);

    let location_task = provider.start();
    let weather_task = store.start();
    tokio::time::sleep(Duration::from_secs(61)).await;

    let fix = provider.state();
    assert!(fix.coordinates.is_none());
    assert!(fix.error.is_some());

    let state = store.state();
    assert_eq!(state.phase(), RefreshPhase::Idle);
    assert!(state.snapshot.is_none());

    location_task.shutdown().await;
    weather_task.shutdown().await;
}

#[tokio::test]
async fn test_web_platform_shows_demo_without_location() {
    let (provider, store) = pipeline(None, Platform::Web);

    let location_task = provider.start();
    let weather_task = store.start();

    assert!(location_task.is_stopped());
    assert!(weather_task.is_stopped());
    assert_eq!(
        provider.state().error.as_deref(),
        Some("Location unavailable on this platform")
    );

    let snap = store.state().snapshot.expect("demo snapshot");
    assert_eq!(snap.location.name, "Ahmedabad");
    assert_eq!(snap.current.temp_f, 89.6);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_stops_both_loops() {
    let (provider, store) = pipeline(Some(AHMEDABAD), Platform::Native);

    let location_task = provider.start();
    let weather_task = store.start();
    tokio::time::sleep(Duration::from_millis(50)).await;

    provider.dispose();
    store.dispose();
    assert!(location_task.is_stopped());
    assert!(weather_task.is_stopped());

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(provider.state().readings, 1);
}
