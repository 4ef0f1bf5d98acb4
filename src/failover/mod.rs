//! Failover Orchestrator
//!
//! Drives one NameNode HA round trip: stop the Active unit, let automatic
//! fail-over promote the Standby, prove data is still readable, bring the
//! stopped unit back and check it rejoined as Standby. Any failed wait is
//! fatal; there is no partial success path.

mod pair;
pub use pair::*;


use std::sync::Arc;

use tracing::info;
use tracing::instrument;

use crate::constants::ACTION_START_NAMENODE;
use crate::constants::ACTION_STOP_NAMENODE;
use crate::utils::CheckpointLog;
use crate::ActionCoordinator;
use crate::ClusterController;
use crate::ConvergenceWaiter;
use crate::FleetExpectation;
use crate::HaReport;
use crate::HarnessConfig;
use crate::Result;
use crate::RoleNames;
use crate::StatusCatalog;
use crate::Topology;
use crate::VerificationError;
use crate::WorkloadVerifier;

/// Phase boundaries of one failover round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailoverPhase {
    /// One Active and one Standby before anything is touched
    Steady,
    StopRequested,
    /// Survivor serving alone, standby missing
    Degraded,
    DegradedArtifactVerified,
    StartRequested,
    /// Active + Standby again
    Restored,
    /// The restarted unit is confirmed Standby
    LabelsSwapped,
    Complete,
}

pub struct FailoverOrchestrator<C: ClusterController> {
    waiter: ConvergenceWaiter<C>,
    actions: ActionCoordinator<C>,
    workload: WorkloadVerifier<C>,
    roles: RoleNames,
    spec_component: String,
}

impl<C: ClusterController> FailoverOrchestrator<C> {
    pub fn new(
        controller: Arc<C>,
        config: &HarnessConfig,
    ) -> Self {
        Self {
            waiter: ConvergenceWaiter::new(controller.clone(), config.convergence),
            actions: ActionCoordinator::new(controller.clone(), config.actions),
            workload: WorkloadVerifier::new(controller, config.workload.clone()),
            roles: config.roles.clone(),
            spec_component: config.upgrade.spec_component.clone(),
        }
    }

    /// Runs the round trip and swaps `pair` once the restarted unit is
    /// confirmed Standby.
    #[instrument(skip_all, fields(pair = %pair))]
    pub async fn run(
        &self,
        topology: &mut Topology,
        pair: &mut HaPair,
    ) -> Result<CheckpointLog<FailoverPhase>> {
        let mut log = CheckpointLog::new();
        let catalog = StatusCatalog::for_topology(topology, &self.roles, &self.spec_component)?;
        let client = topology.first_unit(&self.roles.client)?.name().to_string();
        let namenode = self.roles.namenode.as_str();

        self.waiter
            .await_state(topology, &FleetExpectation::new().role(namenode, catalog.ha_steady()))
            .await?;
        log.record(FailoverPhase::Steady);

        let stopped = pair.active.clone();
        info!(unit = %stopped, "stopping active NameNode");
        self.actions.run_checked(&stopped, ACTION_STOP_NAMENODE).await?;
        log.record(FailoverPhase::StopRequested);

        self.waiter
            .await_state(
                topology,
                &FleetExpectation::new().role(namenode, catalog.ha_degraded_missing_standby()),
            )
            .await?;
        log.record(FailoverPhase::Degraded);

        self.workload.read_artifact(&client).await?;
        log.record(FailoverPhase::DegradedArtifactVerified);

        info!(unit = %stopped, "restarting stopped NameNode");
        self.actions.run_checked(&stopped, ACTION_START_NAMENODE).await?;
        log.record(FailoverPhase::StartRequested);

        self.waiter
            .await_state(topology, &FleetExpectation::new().role(namenode, catalog.ha_steady()))
            .await?;
        log.record(FailoverPhase::Restored);

        let report = topology.unit(&stopped)?.status().and_then(HaReport::classify);
        if report != Some(HaReport::Standby) {
            return Err(VerificationError::HaLabelsUnresolved(format!(
                "{stopped} rejoined as {report:?}, expected Standby"
            ))
            .into());
        }
        pair.swap();
        info!(%pair, "HA labels swapped");
        log.record(FailoverPhase::LabelsSwapped);

        self.workload.read_artifact(&client).await?;
        log.record(FailoverPhase::Complete);
        Ok(log)
    }
}
