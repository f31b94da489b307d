//! Background polling.
//!
//! Cycles run one at a time on the calling task. A new cycle starts every `period`;
//! when a cycle overruns the period, the next one starts as soon as it finishes, so
//! two cycles never overlap. Cancellation is checked between cycles only.

use std::time::Duration;

use log::{error, info, warn};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{Ingestor, ReportSelector};
use crate::config::MIN_POLL_INTERVAL;
use crate::mailbox::Mailbox;
use crate::parser::ReportParser;

impl<M, P> Ingestor<M, P>
where
    M: Mailbox + Sync,
    P: ReportParser + Sync,
{
    /// Runs a cycle for today's reports every `period` until `cancel` fires.
    ///
    /// A failed cycle is logged and the loop waits for the next tick. A `period`
    /// below one second is raised to one second. Returns the number of cycles started.
    pub async fn run_background(&self, period: Duration, cancel: CancellationToken) -> usize {
        let period = if period < MIN_POLL_INTERVAL {
            warn!(
                "Poll interval {:?} is too short, using {:?}",
                period, MIN_POLL_INTERVAL
            );
            MIN_POLL_INTERVAL
        } else {
            period
        };

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cycles = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            cycles += 1;
            match self.run_cycle(ReportSelector::Today).await {
                Ok(report) => info!(
                    "Cycle {} done: {}/{} report(s) parsed in {:.1}s",
                    cycles,
                    report.parsed,
                    report.total,
                    report.elapsed.as_secs_f64()
                ),
                Err(e) => error!("Cycle {} failed: {}", cycles, e),
            }
        }

        info!("Background ingestion stopped after {} cycle(s)", cycles);
        cycles
    }
}
