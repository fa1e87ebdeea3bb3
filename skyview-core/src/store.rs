//! Latest weather snapshot plus loading/error flags, kept in step with the
//! location provider.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::{Local, Timelike};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    config::{DEFAULT_REFRESH_INTERVAL_SECS, Platform},
    error::{LOCATION_NOT_AVAILABLE, RefreshError},
    location::LocationState,
    model::{Coordinates, WeatherSnapshot},
    provider::{
        WeatherFetcher,
        synthetic::{DEMO_COORDINATES, synthetic_snapshot},
    },
    task::{TaskHandle, periodic},
    theme::{Theme, ThemeKey, theme_for, theme_key},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherState {
    /// Last good snapshot. Survives failed refreshes.
    pub snapshot: Option<WeatherSnapshot>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Where the store is in its refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RefreshPhase {
    Idle,
    Loading,
    Ready,
    /// Last refresh failed; an older snapshot may still be shown.
    Failed,
}

impl WeatherState {
    pub fn phase(&self) -> RefreshPhase {
        if self.loading {
            RefreshPhase::Loading
        } else if self.error.is_some() {
            RefreshPhase::Failed
        } else if self.snapshot.is_some() {
            RefreshPhase::Ready
        } else {
            RefreshPhase::Idle
        }
    }

    pub fn theme_key_at(&self, hour: u32) -> Option<ThemeKey> {
        self.snapshot
            .as_ref()
            .map(|s| theme_key(&s.current.condition, hour))
    }

    pub fn theme_at(&self, hour: u32) -> Theme {
        theme_for(self.snapshot.as_ref(), hour)
    }
}

#[derive(Debug, Clone)]
pub struct WeatherStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    fetcher: Arc<dyn WeatherFetcher>,
    location: watch::Receiver<LocationState>,
    platform: Platform,
    interval: Duration,
    state: watch::Sender<WeatherState>,
    /// Token of the most recently issued fetch.
    issued: AtomicU64,
    alive: CancellationToken,
}

impl WeatherStore {
    pub fn new(
        fetcher: Arc<dyn WeatherFetcher>,
        location: watch::Receiver<LocationState>,
    ) -> Self {
        Self::with_options(
            fetcher,
            location,
            Platform::Native,
            Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
        )
    }

    pub fn with_options(
        fetcher: Arc<dyn WeatherFetcher>,
        location: watch::Receiver<LocationState>,
        platform: Platform,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(WeatherState::default());
        Self {
            inner: Arc::new(Inner {
                fetcher,
                location,
                platform,
                interval,
                state,
                issued: AtomicU64::new(0),
                alive: CancellationToken::new(),
            }),
        }
    }

    pub fn state(&self) -> WeatherState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.inner.state.subscribe()
    }

    pub fn theme(&self) -> Theme {
        self.inner.state.borrow().theme_at(Local::now().hour())
    }

    /// `None` until the first snapshot arrives.
    pub fn theme_key(&self) -> Option<ThemeKey> {
        self.inner.state.borrow().theme_key_at(Local::now().hour())
    }

    fn coordinates(&self) -> Option<Coordinates> {
        self.inner.location.borrow().coordinates
    }

    /// Fetch weather for the current fix and publish the result.
    ///
    /// Without a fix this only records "Location not available". A failed
    /// fetch keeps the previous snapshot. Only the most recently issued
    /// refresh may publish; older ones return [`RefreshError::Superseded`].
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        if self.is_disposed() {
            return Err(RefreshError::Disposed);
        }

        let Some(coords) = self.coordinates() else {
            tracing::warn!("Weather refresh skipped: no location fix");
            self.update(|s| {
                s.error = Some(LOCATION_NOT_AVAILABLE.to_string());
                s.loading = false;
            });
            return Err(RefreshError::NoLocation);
        };

        let token = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.update(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = self.inner.fetcher.fetch(coords).await;

        if self.is_disposed() {
            tracing::debug!(token, "Dropping weather result for disposed store");
            return Err(RefreshError::Disposed);
        }

        let is_latest = || self.inner.issued.load(Ordering::SeqCst) == token;

        match result {
            Ok(snapshot) => {
                let published = self.inner.state.send_if_modified(|s| {
                    if !is_latest() {
                        return false;
                    }
                    s.snapshot = Some(snapshot);
                    s.loading = false;
                    s.error = None;
                    true
                });
                if !published {
                    tracing::debug!(token, "Dropping superseded weather result");
                    return Err(RefreshError::Superseded);
                }
                tracing::info!(%coords, "weather updated");
                Ok(())
            }
            Err(e) => {
                let published = self.inner.state.send_if_modified(|s| {
                    if !is_latest() {
                        return false;
                    }
                    s.error = Some(e.user_message().to_string());
                    s.loading = false;
                    true
                });
                if !published {
                    tracing::debug!(token, "Dropping superseded weather failure");
                    return Err(RefreshError::Superseded);
                }
                tracing::warn!("Weather refresh failed: {e}");
                Err(e.into())
            }
        }
    }

    /// Fire-and-forget [`refresh`](Self::refresh), e.g. for pull-to-refresh.
    pub fn spawn_refresh(&self) {
        let store = self.clone();
        tokio::spawn(async move {
            let _ = store.refresh().await;
        });
    }

    /// Follow the location provider: refresh on start when a fix exists, on
    /// every new fix, and on every interval while a fix is known.
    ///
    /// On a platform without location the demo snapshot is published once
    /// and no timer runs.
    pub fn start(&self) -> TaskHandle {
        if self.inner.platform == Platform::Web {
            let demo = synthetic_snapshot(DEMO_COORDINATES, Local::now().naive_local());
            self.update(move |s| {
                s.snapshot = Some(demo);
                s.loading = false;
                s.error = None;
            });
            return TaskHandle::idle();
        }

        let store = self.clone();
        let mut location = self.inner.location.clone();

        TaskHandle::spawn(self.inner.alive.child_token(), async move {
            let mut ticker = periodic(store.inner.interval);
            let mut seen = location.borrow_and_update().readings;
            let mut location_open = true;

            if store.coordinates().is_some() {
                store.spawn_refresh();
            }

            loop {
                tokio::select! {
                    changed = location.changed(), if location_open => {
                        if changed.is_err() {
                            tracing::debug!("Location provider gone; timer refresh only");
                            location_open = false;
                        } else {
                            let readings = location.borrow_and_update().readings;
                            if readings != seen {
                                seen = readings;
                                store.spawn_refresh();
                            }
                        }
                    }
                    _ = ticker.tick() => {
                        if store.coordinates().is_some() {
                            store.spawn_refresh();
                        } else {
                            tracing::debug!("Weather tick skipped: no location fix");
                        }
                    }
                }
            }
        })
    }

    /// Stop all timers; in-flight fetches that finish afterwards are ignored.
    pub fn dispose(&self) {
        tracing::debug!("weather store disposed");
        self.inner.alive.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.alive.is_cancelled()
    }

    fn update(&self, f: impl FnOnce(&mut WeatherState)) {
        if self.is_disposed() {
            return;
        }
        self.inner.state.send_modify(f);
    }
}
