//! Periodic session validation for single-session roles.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::debug;

/// Drives a validation probe at a fixed interval until cancelled.
///
/// The first probe fires one full interval after start, not immediately;
/// login has just validated the session. Probe failures are logged and do
/// not stop the loop. The probe itself is what notices a dead session and
/// tears the tab down, so the monitor keeps ticking until the teardown
/// flips the cancel signal.
#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    interval: Duration,
}

impl HeartbeatMonitor {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Run the probe loop until `cancel` flips to true.
    pub async fn run<F, Fut>(&self, mut cancel: watch::Receiver<bool>, tick: F)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = hrdesk_core::AppResult<()>>,
    {
        let mut timer = time::interval_at(Instant::now() + self.interval, self.interval);
        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        debug!("Heartbeat monitor stopped");
                        return;
                    }
                }
                _ = timer.tick() => {
                    if let Err(e) = tick().await {
                        debug!(error = %e, "Heartbeat probe failed");
                    }
                }
            }
        }
    }
}
