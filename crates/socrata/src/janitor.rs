//! Periodic sweep of expired response-cache entries.

use crate::cache::SharedCache;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Shortest sweep interval; a zero interval is raised to this.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Background task that sweeps expired cache entries on a fixed interval.
///
/// Runs until [`CacheJanitor::shutdown`] is awaited or its token is
/// cancelled. Dropping the handle without shutting down leaves the task
/// running for the life of the runtime.
pub struct CacheJanitor {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl CacheJanitor {
    pub fn spawn(cache: SharedCache, every: Duration) -> Self {
        let every = every.max(MIN_SWEEP_INTERVAL);
        let token = CancellationToken::new();
        let shutdown = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // Skip the first immediate tick.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = cache.lock().cleanup();
                        if removed > 0 {
                            tracing::debug!(target: "opengov::cache", removed, "swept expired entries");
                        }
                    }
                }
            }
            tracing::debug!(target: "opengov::cache", "cache janitor stopped");
        });
        Self { token, handle }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stops the sweep loop and waits for the task to finish.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(target: "opengov::cache", error = %e, "cache janitor task failed");
        }
    }
}
