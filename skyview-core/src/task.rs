//! Handles for the periodic refresh loops.

use std::{future::Future, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, Interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

/// A running background loop. Stopping it, or dropping the handle, cancels
/// the loop before its next tick.
#[derive(Debug)]
pub struct TaskHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub(crate) fn spawn<F>(cancel: CancellationToken, fut: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = cancel.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = guard.cancelled() => {}
                _ = fut => {}
            }
        });

        Self { cancel, task: Some(task) }
    }

    /// A handle with nothing behind it, for components that decline to start.
    pub fn idle() -> Self {
        let cancel = CancellationToken::new();
        cancel.cancel();
        Self { cancel, task: None }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the loop and wait for it to wind down.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Refresh loop ended abnormally: {e}");
            }
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Interval whose first tick is one full `period` away. Missed ticks are
/// skipped so a slow refresh never causes a burst.
pub(crate) fn periodic(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}
