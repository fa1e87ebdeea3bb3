//! Device location: permission, position fixes and reverse geocoding.
//!
//! [`LocationProvider`] is the only writer of [`LocationState`]; everything
//! else observes it through [`LocationProvider::subscribe`].

use std::{fmt::Debug, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    config::{DEFAULT_REFRESH_INTERVAL_SECS, Platform},
    error::LocationError,
    model::{Address, Coordinates},
    task::{TaskHandle, periodic},
};

pub mod fixed;

pub use fixed::FixedLocationService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// The device's location capabilities.
#[async_trait]
pub trait LocationService: Send + Sync + Debug {
    /// Current permission, without prompting.
    async fn permission_status(&self) -> Result<PermissionStatus, LocationError>;

    /// Prompt the user for permission.
    async fn request_permission(&self) -> Result<PermissionStatus, LocationError>;

    async fn current_position(&self) -> Result<Coordinates, LocationError>;

    /// Candidate addresses for `coords`, best match first. May be empty.
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Vec<Address>, LocationError>;
}

/// What observers see of the location provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationState {
    /// `None` until the first fix; not an error by itself.
    pub coordinates: Option<Coordinates>,
    pub address: Option<Address>,
    pub loading: bool,
    pub error: Option<String>,
    /// Number of successful fixes so far. Changes on every new fix, even if
    /// the coordinates are identical.
    pub readings: u64,
}

#[derive(Debug, Clone)]
pub struct LocationProvider {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    service: Arc<dyn LocationService>,
    platform: Platform,
    interval: Duration,
    state: watch::Sender<LocationState>,
    alive: CancellationToken,
}

impl LocationProvider {
    pub fn new(service: Arc<dyn LocationService>, platform: Platform) -> Self {
        Self::with_interval(
            service,
            platform,
            Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
        )
    }

    pub fn with_interval(
        service: Arc<dyn LocationService>,
        platform: Platform,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(LocationState::default());
        Self {
            inner: Arc::new(Inner {
                service,
                platform,
                interval,
                state,
                alive: CancellationToken::new(),
            }),
        }
    }

    pub fn state(&self) -> LocationState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LocationState> {
        self.inner.state.subscribe()
    }

    /// Ask for location permission. Already granted means no prompt.
    pub async fn request_permission(&self) -> Result<PermissionStatus, LocationError> {
        self.ensure_supported()?;
        self.update(|s| {
            s.loading = true;
            s.error = None;
        });

        let service = &self.inner.service;
        let status = match service.permission_status().await {
            Ok(PermissionStatus::Granted) => Ok(PermissionStatus::Granted),
            Ok(PermissionStatus::Denied) => service.request_permission().await,
            Err(e) => Err(e),
        };

        match status {
            Ok(PermissionStatus::Granted) => {
                self.update(|s| s.loading = false);
                Ok(PermissionStatus::Granted)
            }
            Ok(PermissionStatus::Denied) => {
                self.fail(&LocationError::PermissionDenied);
                Ok(PermissionStatus::Denied)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Take a new fix and look up its address.
    ///
    /// A failed or empty reverse lookup still counts as success, with no
    /// address. On error the previous fix stays in place.
    pub async fn refresh_location(
        &self,
    ) -> Result<(Coordinates, Option<Address>), LocationError> {
        self.ensure_supported()?;
        self.update(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.acquire().await {
            Ok((coords, address)) => {
                tracing::info!(%coords, "location fix");
                let stored = address.clone();
                self.update(move |s| {
                    s.coordinates = Some(coords);
                    s.address = stored;
                    s.loading = false;
                    s.readings += 1;
                });
                Ok((coords, address))
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Request permission, take a fix, then refresh on every interval until
    /// the returned handle is stopped.
    ///
    /// Platforms without location support get an error state and no timer.
    pub fn start(&self) -> TaskHandle {
        if self.ensure_supported().is_err() {
            return TaskHandle::idle();
        }

        let provider = self.clone();
        TaskHandle::spawn(self.inner.alive.child_token(), async move {
            let mut ticker = periodic(provider.inner.interval);

            if let Ok(PermissionStatus::Granted) = provider.request_permission().await {
                let _ = provider.refresh_location().await;
            }

            loop {
                ticker.tick().await;
                let _ = provider.refresh_location().await;
            }
        })
    }

    /// Stop all timers; results that land afterwards are discarded.
    pub fn dispose(&self) {
        tracing::debug!("location provider disposed");
        self.inner.alive.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.alive.is_cancelled()
    }

    async fn acquire(&self) -> Result<(Coordinates, Option<Address>), LocationError> {
        let service = &self.inner.service;

        if service.permission_status().await? != PermissionStatus::Granted {
            return Err(LocationError::PermissionDenied);
        }

        let coords = service.current_position().await?;

        let address = match service.reverse_geocode(coords).await {
            Ok(candidates) => candidates.into_iter().find(|a| !a.is_empty()),
            Err(e) => {
                tracing::debug!("Reverse geocode failed, continuing without address: {e}");
                None
            }
        };

        Ok((coords, address))
    }

    fn ensure_supported(&self) -> Result<(), LocationError> {
        if self.inner.platform.has_location() {
            Ok(())
        } else {
            self.fail(&LocationError::Unavailable);
            Err(LocationError::Unavailable)
        }
    }

    fn fail(&self, err: &LocationError) {
        tracing::warn!("Location refresh failed: {err}");
        let message = err.to_string();
        self.update(move |s| {
            s.error = Some(message);
            s.loading = false;
        });
    }

    fn update(&self, f: impl FnOnce(&mut LocationState)) {
        if self.is_disposed() {
            return;
        }
        self.inner.state.send_modify(f);
    }
}
