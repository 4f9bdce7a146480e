//! Polling Policy
//!
//! Periodic refetch of the profile and loaded feeds. A poll result replaces
//! the cached view, so a local patch is at most one interval stale.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_PROFILE_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_FEED_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    pub enabled: bool,
    pub profile_interval: Duration,
    pub feed_interval: Duration,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            profile_interval: DEFAULT_PROFILE_INTERVAL,
            feed_interval: DEFAULT_FEED_INTERVAL,
        }
    }
}

impl PollingPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn profile_every(&self) -> Option<Duration> {
        self.enabled.then_some(self.profile_interval)
    }

    pub fn feed_every(&self) -> Option<Duration> {
        self.enabled.then_some(self.feed_interval)
    }
}

/// Running poll loop; dropping it stops the loop
pub struct PollHandle {
    handle: JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(self) {}
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Call `tick` every `every` on the current runtime, starting immediately.
/// Returns `None` when polling is off.
pub fn spawn_poll<F, Fut>(every: Option<Duration>, mut tick: F) -> Option<PollHandle>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let every = every?;
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            tick().await;
        }
    });
    Some(PollHandle { handle })
}
