//! Convergence Waiter
//!
//! Polls fleet status until a [`FleetExpectation`] holds or the deadline
//! expires. Every higher-level step uses it to detect that the cluster has
//! settled after a change.


use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::instrument;

use crate::status;
use crate::utils::PollSchedule;
use crate::ClusterController;
use crate::ConvergenceConfig;
use crate::ConvergenceError;
use crate::FleetExpectation;
use crate::FleetStatus;
use crate::Result;
use crate::Topology;

pub struct ConvergenceWaiter<C: ClusterController> {
    controller: Arc<C>,
    config: ConvergenceConfig,
}

impl<C: ClusterController> ConvergenceWaiter<C> {
    pub fn new(
        controller: Arc<C>,
        config: ConvergenceConfig,
    ) -> Self {
        Self { controller, config }
    }

    /// Reads the current status of every role named by `expected` and records
    /// it on the topology's units.
    pub async fn observe(
        &self,
        topology: &mut Topology,
        expected: &FleetExpectation,
    ) -> Result<FleetStatus> {
        let mut observed = FleetStatus::new();
        for (role, _) in expected.roles() {
            let units = self.controller.current_status(role).await?;
            topology.record_status(role, &units);
            observed.insert(role.to_string(), units);
        }
        Ok(observed)
    }

    /// Waits with the configured default budget.
    pub async fn await_state(
        &self,
        topology: &mut Topology,
        expected: &FleetExpectation,
    ) -> Result<FleetStatus> {
        self.await_state_within(topology, expected, self.config.timeout())
            .await
    }

    /// Polls until `expected` holds, returning the satisfying observation.
    ///
    /// On expiry returns [`ConvergenceError::TimedOut`] with the last
    /// observation diffed against `expected`. Controller errors abort the wait.
    #[instrument(skip_all, fields(timeout = ?timeout))]
    pub async fn await_state_within(
        &self,
        topology: &mut Topology,
        expected: &FleetExpectation,
        timeout: Duration,
    ) -> Result<FleetStatus> {
        let mut schedule = PollSchedule::new(self.config.poll_interval(), timeout);
        let mut last = FleetStatus::new();

        while schedule.next_attempt().await {
            let observed = self.observe(topology, expected).await?;
            if status::matches(&observed, expected) {
                info!(
                    attempts = schedule.attempts(),
                    elapsed = ?schedule.elapsed(),
                    "fleet converged"
                );
                return Ok(observed);
            }
            debug!(attempt = schedule.attempts(), "fleet not converged yet");
            last = observed;
        }

        let diff = status::diff(&last, expected);
        error!("fleet did not converge:\n{}", diff);
        Err(ConvergenceError::TimedOut {
            waited: schedule.elapsed(),
            diff,
        }
        .into())
    }
}
