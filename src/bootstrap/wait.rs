//! Reconciliation wait
//!
//! Gates on the controller's readiness check through the bounded poller,
//! then runs two best-effort follow-up probes. Only the readiness gate is
//! fatal; follow-up failures are recorded as warnings in the summary.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::warn;

use crate::error::Result;
use crate::ops::ReconcilerProbe;
use crate::poll::BoundedPoller;

/// Interval between readiness probes.
pub const RECONCILE_POLL_INTERVAL: Duration = Duration::from_secs(15);

pub struct ReconciliationWaiter {
    probe: Arc<dyn ReconcilerProbe>,
    interval: Duration,
}

impl ReconciliationWaiter {
    pub fn new(probe: Arc<dyn ReconcilerProbe>) -> Self {
        Self {
            probe,
            interval: RECONCILE_POLL_INTERVAL,
        }
    }

    /// Override the poll interval; tests use millisecond intervals.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn wait(
        &self,
        namespace: &str,
        timeout: Duration,
        shutdown: Option<watch::Receiver<bool>>,
    ) -> Result<String> {
        let poller = BoundedPoller::new(self.interval, timeout);
        let outcome = poller.poll(|| self.probe.check(), shutdown).await?;

        let mut results = vec![format!(
            "Controller check passed after {}s ({} attempt(s)):\n{}",
            outcome.elapsed.as_secs(),
            outcome.attempts,
            outcome.output
        )];

        match self.probe.reconcile_source(namespace).await {
            Ok(output) => results.push(format!("Source reconciled:\n{output}")),
            Err(err) => {
                warn!("source reconcile failed: {err}");
                results.push(format!("Warning - source reconcile failed: {err}"));
            }
        }

        match self.probe.list_resources(namespace).await {
            Ok(output) => results.push(format!("Managed resources:\n{output}")),
            Err(err) => {
                warn!("listing managed resources failed: {err}");
                results.push(format!("Warning - listing managed resources failed: {err}"));
            }
        }

        Ok(results.join("\n"))
    }
}
