use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::application::usecases::{PollOnceUseCase, TickReport};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(120);

/// Drives `PollOnceUseCase` on a fixed cadence.
///
/// The first tick fires immediately. Ticks run sequentially on this task, so
/// they never overlap; ticks missed while one overran are skipped.
pub struct Poller<'a> {
    pub poll_once: PollOnceUseCase<'a>,
    pub interval: Duration,
}

impl<'a> Poller<'a> {
    pub async fn tick(&self) -> Option<TickReport> {
        match self.poll_once.execute().await {
            Ok(report) => {
                info!(
                    watches = report.watches,
                    new_items = report.new_items,
                    failed_checks = report.failed_checks,
                    "poll tick completed"
                );
                Some(report)
            }
            Err(e) => {
                error!("poll tick failed: {e}");
                None
            }
        }
    }

    /// Polls until `shutdown` resolves. An in-flight tick is allowed to finish.
    pub async fn run_until<F>(&self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(interval_secs = self.interval.as_secs(), "polling started");

        let mut ticks = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.tick().await;
                    ticks += 1;
                }
            }
        }
        info!(ticks, "polling stopped");
        ticks
    }
}
