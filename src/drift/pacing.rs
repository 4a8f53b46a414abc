//! Call pacing for rate-limited services.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Decides how long to wait before the next outbound call.
pub trait Pacer {
    /// Wait until a call is allowed, then record it as started.
    async fn wait(&self);
}

/// Enforces a minimum interval between the starts of consecutive calls.
#[derive(Debug)]
pub struct MinIntervalPacer {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl MinIntervalPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Reserve the next slot and return how long to sleep before it.
    fn reserve(&self) -> Duration {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let slot = match *last {
            Some(prev) => (prev + self.interval).max(now),
            None => now,
        };
        *last = Some(slot);
        slot - now
    }
}

impl Pacer for MinIntervalPacer {
    async fn wait(&self) {
        let delay = self.reserve();
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "Pacing oracle call");
            sleep(delay).await;
        }
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    async fn wait(&self) {}
}

/// Pacer chosen from the configured interval; a zero interval disables pacing.
#[derive(Debug)]
pub enum ConfiguredPacer {
    Interval(MinIntervalPacer),
    Unpaced(NoPacing),
}

impl ConfiguredPacer {
    pub fn new(interval: Duration) -> Self {
        if interval.is_zero() {
            ConfiguredPacer::Unpaced(NoPacing)
        } else {
            ConfiguredPacer::Interval(MinIntervalPacer::new(interval))
        }
    }
}

impl Pacer for ConfiguredPacer {
    async fn wait(&self) {
        match self {
            ConfiguredPacer::Interval(p) => p.wait().await,
            ConfiguredPacer::Unpaced(p) => p.wait().await,
        }
    }
}
