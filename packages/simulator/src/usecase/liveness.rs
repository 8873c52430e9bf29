//! Liveness monitor: periodic staleness check of one connection.

use std::{sync::Arc, time::Duration};

use nigiwai_shared::time::Clock;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::domain::{ActivityTracker, ConnectionHandle};

/// Timing of the liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Period between checks; the first check runs one period after attach
    pub interval: Duration,
    /// Silence (milliseconds since the last message) after which a warmed-up
    /// connection counts as stale
    pub stale_after_millis: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            stale_after_millis: 15_000,
        }
    }
}

/// Whether a connection counts as stale at `now`.
///
/// Connections that have not seen both a message and a ping yet are never
/// stale.
pub fn is_stale(activity: &ActivityTracker, now: i64, stale_after_millis: i64) -> bool {
    activity.is_warmed_up() && now - activity.last_message_at() > stale_after_millis
}

/// Attaches staleness timers to connection handles
#[derive(Clone)]
pub struct LivenessMonitor {
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
}

impl LivenessMonitor {
    pub fn new(config: MonitorConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Start checking `handle` periodically, calling `on_stale(user_index)`
    /// on every tick that finds it stale.
    ///
    /// The monitor never tears the connection down itself. Attaching again
    /// replaces the previous timer.
    pub fn attach<F>(&self, handle: &mut ConnectionHandle, on_stale: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        let activity = handle.activity().clone();
        let user_index = handle.user_index();
        let clock = self.clock.clone();
        let config = self.config;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + config.interval, config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if is_stale(&activity, clock.now_millis(), config.stale_after_millis) {
                    on_stale(user_index);
                }
            }
        });
        handle.set_monitor(task);
    }

    /// Stop checking `handle`. Idempotent.
    pub fn detach(handle: &mut ConnectionHandle) -> bool {
        handle.detach_monitor()
    }
}
