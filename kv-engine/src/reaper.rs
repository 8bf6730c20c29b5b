use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::store::StoreInner;

/// Handle for the background cleanup task. Shutdown is signal-and-await so
/// the task never dies while holding the write lock.
pub(crate) struct ReaperHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    pub(crate) async fn shutdown(self) {
        self.token.cancel();
        let _ = self.task.await;
    }

    /// Cancellation-only path for Drop, where awaiting is not possible.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }
}

pub(crate) fn spawn(
    inner: Arc<RwLock<StoreInner>>,
    interval: Duration,
    max_batch: usize,
) -> ReaperHandle {
    let token = CancellationToken::new();
    let run_token = token.clone();
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval fires immediately; consume it so
        // runs start one full interval after store creation.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = run_token.cancelled() => break,
                _ = ticker.tick() => {
                    let mut guard = inner.write().await;
                    let dropped = guard.sweep_expired(Instant::now(), max_batch);
                    drop(guard);
                    if dropped > 0 {
                        trace!(dropped, "reaper removed expired entries");
                    }
                }
            }
        }
    });
    ReaperHandle { token, task }
}
