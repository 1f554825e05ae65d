//! Periodic cache maintenance.
//!
//! [`spawn_cleanup`] starts a tokio task that calls
//! [`OriginResolver::cleanup`] at a fixed period. The first run happens one
//! full period after start. The task stops when [`CleanupTask::cancel`] is
//! called or the handle is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::resolver::OriginResolver;

/// Handle to a running cleanup task
#[derive(Debug)]
pub struct CleanupTask {
    handle: Option<JoinHandle<()>>,
}

impl CleanupTask {
    /// Stop the task. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Cache cleanup task cancelled");
        }
    }

    /// Whether the task is still scheduled.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for CleanupTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run `resolver.cleanup()` every `period` on the current tokio runtime.
///
/// # Panics
///
/// Panics if called outside a tokio runtime, or if `period` is zero.
pub fn spawn_cleanup(resolver: Arc<OriginResolver>, period: Duration) -> CleanupTask {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let handle = tokio::spawn(async move {
        loop {
            ticker.tick().await;
            let report = resolver.cleanup();
            debug!(
                coverage_cleared = ?report.coverage_cleared,
                origins_cleared = ?report.origins_cleared,
                "Cache cleanup tick"
            );
        }
    });

    CleanupTask {
        handle: Some(handle),
    }
}
