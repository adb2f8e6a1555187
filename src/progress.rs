//! Simulated upload progress.
//!
//! The endpoint reports nothing until it answers, so progress for the job in
//! flight is faked: a periodic task nudges it upward, capped below 100,
//! until the real outcome arrives.

use crate::constants::{PROGRESS_CAP, PROGRESS_INITIAL, PROGRESS_STEP, PROGRESS_TICK};
use crate::state::BatchState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSettings {
    /// Progress assigned when the upload starts
    pub initial: u8,
    pub step: u8,
    /// Simulated progress never exceeds this
    pub cap: u8,
    pub tick: Duration,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            initial: PROGRESS_INITIAL,
            step: PROGRESS_STEP,
            cap: PROGRESS_CAP,
            tick: PROGRESS_TICK,
        }
    }
}

/// Handle to a running progress task.
///
/// `stop` consumes the ticker, so a ticker can only be stopped once. Dropping
/// it without stopping still cancels the task.
pub struct ProgressTicker {
    guard: DropGuard,
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    /// Cancels the task and waits for it to exit. Once this returns the
    /// ticker will not touch the batch again.
    pub async fn stop(self) {
        let token = self.guard.disarm();
        token.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Progress ticker ended abnormally");
        }
    }
}

/// Starts nudging the progress of job `index` every `settings.tick`.
pub fn start_fake_progress(
    state: Arc<BatchState>,
    index: usize,
    settings: ProgressSettings,
) -> ProgressTicker {
    let token = CancellationToken::new();
    let cancelled = token.clone();

    let handle = tokio::spawn(async move {
        let mut ticks = interval_at(Instant::now() + settings.tick, settings.tick);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => break,
                _ = ticks.tick() => {
                    state.advance_progress(index, settings.step, settings.cap);
                }
            }
        }
    });

    ProgressTicker {
        guard: token.drop_guard(),
        handle,
    }
}
