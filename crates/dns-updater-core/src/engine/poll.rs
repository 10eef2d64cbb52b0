//! Fixed-interval driver for an update cycle

use super::UpdateCycle;
use crate::error::{Error, Result};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Runs an [`UpdateCycle`] immediately and then on every interval tick
///
/// ## Lifecycle
///
/// 1. Create with [`PollLoop::new()`]
/// 2. Start with [`PollLoop::run()`]
/// 3. Loop runs until the token is cancelled
///
/// ## Failure handling
///
/// A failed cycle is logged and the loop waits for the next tick. There is
/// no backoff and no error is ever fatal to the loop.
///
/// ## Threading
///
/// Cycles run strictly one after another on the caller's task. A slow cycle
/// delays the following tick rather than overlapping with it.
pub struct PollLoop {
    cycle: UpdateCycle,
    interval: Duration,
}

impl PollLoop {
    /// Create a poll loop
    ///
    /// Fails with a configuration error if `interval` is zero.
    pub fn new(cycle: UpdateCycle, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::config("Poll interval must be positive"));
        }
        Ok(Self { cycle, interval })
    }

    /// The wrapped cycle
    pub fn cycle(&self) -> &UpdateCycle {
        &self.cycle
    }

    /// Run until `cancel` fires
    ///
    /// The token is handed to every cycle, so cancellation also aborts an
    /// in-flight fetch, read, write or upsert.
    pub async fn run(&self, cancel: CancellationToken) {
        let record = self.cycle.target().name().to_string();
        info!(record = %record, "Starting poll loop (interval={:?})", self.interval);

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                Some(_) = ticks.next() => {
                    match self.cycle.run_once(&cancel).await {
                        Ok(outcome) => {
                            debug!(record = %record, "Cycle complete: {:?}", outcome);
                        }
                        Err(e) if e.is_cancelled() => {
                            debug!(record = %record, "Cycle interrupted by shutdown");
                        }
                        Err(e) => {
                            error!(record = %record, "Update failed: {}", e);
                        }
                    }
                }
            }
        }

        info!(record = %record, "Poll loop stopped");
    }
}
