//! SamplingDriver - The control loop of the pipeline
//!
//! ```text
//! tick → Sampler::sample → AlertEvaluator::evaluate → attach alerts → HubHandle::publish
//! ```
//!
//! At most one cycle is in flight. A tick that fires while a cycle is still
//! running is skipped rather than queued, so a slow sampler delays the stream
//! but never builds up a backlog.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, instrument, trace, warn};

use crate::alerts::AlertEvaluator;
use crate::sampler::Sampler;

use super::hub::HubHandle;
use super::messages::HubError;

/// Drives one sample → evaluate → publish cycle per interval tick
pub struct SamplingDriver<S> {
    sampler: S,
    evaluator: AlertEvaluator,
    hub: HubHandle,
    interval: Duration,
}

impl<S: Sampler + 'static> SamplingDriver<S> {
    pub fn new(sampler: S, evaluator: AlertEvaluator, hub: HubHandle, interval: Duration) -> Self {
        Self {
            sampler,
            evaluator,
            hub,
            interval,
        }
    }

    /// Run a single cycle and return the number of subscribers reached.
    pub async fn run_cycle(&mut self) -> Result<usize, HubError> {
        let snapshot = self.sampler.sample().await;
        let alerts = self.evaluator.evaluate(&snapshot).await;

        if !alerts.is_empty() {
            trace!("attaching {} alerts", alerts.len());
        }

        self.hub.publish(snapshot.with_alerts(alerts)).await
    }

    /// Start ticking. The driver runs until the hub stops.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    #[instrument(skip(self), fields(interval = ?self.interval))]
    async fn run(mut self) {
        debug!("starting sampling driver");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut last_report = None;

        loop {
            ticker.tick().await;

            match self.run_cycle().await {
                Ok(delivered) => {
                    let second = chrono::Utc::now().timestamp();
                    if delivered > 0 && second % 10 == 0 && last_report != Some(second) {
                        debug!("{delivered} subscribers connected");
                        last_report = Some(second);
                    }
                }
                Err(HubError::Closed) => {
                    warn!("broadcast hub stopped, ending sampling loop");
                    break;
                }
                Err(e) => {
                    error!("skipping broadcast: {e}");
                }
            }
        }

        debug!("sampling driver stopped");
    }
}
