//! End-to-end verification scenario.
//!
//! Strictly sequential phases with an assertion at every boundary:
//! `Setup → Components → HdfsDirectories → Artifact → Workload → Failover →
//! Upgrade → Complete`. The first failure aborts the scenario and nothing is
//! cleaned up.

#[cfg(test)]
mod scenario_test;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::error;
use tracing::info;
use tracing::instrument;

use crate::status;
use crate::utils::CheckpointLog;
use crate::ClusterController;
use crate::ComponentVerifier;
use crate::ConvergenceWaiter;
use crate::Error;
use crate::Expectation;
use crate::FailoverOrchestrator;
use crate::FleetExpectation;
use crate::HaPair;
use crate::HarnessConfig;
use crate::Result;
use crate::StatusCatalog;
use crate::StatusDiff;
use crate::Topology;
use crate::UpgradeOrchestrator;
use crate::VerificationError;
use crate::WorkloadVerifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScenarioPhase {
    /// Initial steady state reached and HA labels discovered
    Setup,
    Components,
    HdfsDirectories,
    /// Test file written and read back
    Artifact,
    Workload,
    Failover,
    Upgrade,
    Complete,
}

impl ScenarioPhase {
    pub const ALL: [ScenarioPhase; 8] = [
        ScenarioPhase::Setup,
        ScenarioPhase::Components,
        ScenarioPhase::HdfsDirectories,
        ScenarioPhase::Artifact,
        ScenarioPhase::Workload,
        ScenarioPhase::Failover,
        ScenarioPhase::Upgrade,
        ScenarioPhase::Complete,
    ];

    fn as_str(self) -> &'static str {
        match self {
            ScenarioPhase::Setup => "setup",
            ScenarioPhase::Components => "components",
            ScenarioPhase::HdfsDirectories => "hdfs-directories",
            ScenarioPhase::Artifact => "artifact",
            ScenarioPhase::Workload => "workload",
            ScenarioPhase::Failover => "failover",
            ScenarioPhase::Upgrade => "upgrade",
            ScenarioPhase::Complete => "complete",
        }
    }
}

impl fmt::Display for ScenarioPhase {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioPhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ScenarioPhase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| Error::Fatal(format!("unknown phase {s}")))
    }
}

pub struct ScenarioRunner<C: ClusterController> {
    config: HarnessConfig,
    topology: Topology,
    pair: Option<HaPair>,
    log: CheckpointLog<ScenarioPhase>,
    waiter: ConvergenceWaiter<C>,
    components: ComponentVerifier<C>,
    workload: WorkloadVerifier<C>,
    failover: FailoverOrchestrator<C>,
    upgrade: UpgradeOrchestrator<C>,
}

impl<C: ClusterController> ScenarioRunner<C> {
    pub fn new(
        controller: Arc<C>,
        config: HarnessConfig,
        topology: Topology,
    ) -> Result<Self> {
        topology.require_roles(&config.roles)?;
        Ok(Self {
            waiter: ConvergenceWaiter::new(controller.clone(), config.convergence),
            components: ComponentVerifier::new(controller.clone(), config.roles.clone()),
            workload: WorkloadVerifier::new(controller.clone(), config.workload.clone()),
            failover: FailoverOrchestrator::new(controller.clone(), &config),
            upgrade: UpgradeOrchestrator::new(controller, &config),
            config,
            topology,
            pair: None,
            log: CheckpointLog::new(),
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Current HA labels, once setup discovered them
    pub fn pair(&self) -> Option<&HaPair> {
        self.pair.as_ref()
    }

    pub fn checkpoints(&self) -> &CheckpointLog<ScenarioPhase> {
        &self.log
    }

    pub async fn run(&mut self) -> Result<()> {
        self.run_from(ScenarioPhase::Setup).await
    }

    /// Runs every phase from `from` onwards.
    ///
    /// Setup always runs first since HA labels have to be rediscovered.
    /// Resuming at or after [`ScenarioPhase::Failover`] requires the artifact
    /// to be readable already.
    #[instrument(skip(self))]
    pub async fn run_from(
        &mut self,
        from: ScenarioPhase,
    ) -> Result<()> {
        let result = self.phases_from(from).await;
        if let Err(e) = &result {
            error!(last_checkpoint = ?self.log.last(), "scenario aborted: {e}");
        }
        result
    }

    async fn phases_from(
        &mut self,
        from: ScenarioPhase,
    ) -> Result<()> {
        self.setup().await?;

        if from >= ScenarioPhase::Failover && !self.artifact_readable().await? {
            return Err(VerificationError::PhaseOrder {
                requested: from.to_string(),
                required: ScenarioPhase::Artifact.to_string(),
            }
            .into());
        }

        for phase in ScenarioPhase::ALL.into_iter().filter(|p| *p > ScenarioPhase::Setup && *p >= from) {
            match phase {
                ScenarioPhase::Setup => {}
                ScenarioPhase::Components => self.verify_components().await?,
                ScenarioPhase::HdfsDirectories => self.prepare_hdfs_directories().await?,
                ScenarioPhase::Artifact => self.write_artifact().await?,
                ScenarioPhase::Workload => self.run_workload().await?,
                ScenarioPhase::Failover => self.run_failover().await?,
                ScenarioPhase::Upgrade => self.run_upgrade().await?,
                ScenarioPhase::Complete => info!("scenario complete"),
            }
            self.log.record(phase);
        }
        Ok(())
    }

    /// Waits for the initial steady state and classifies the NameNodes.
    pub async fn setup(&mut self) -> Result<()> {
        let roles = &self.config.roles;
        let catalog = self.catalog()?;
        let expected = FleetExpectation::new()
            .role(&roles.plugin, Expectation::exact(catalog.plugin_ready()))
            .role(&roles.namenode, catalog.ha_steady());
        self.waiter.await_state(&mut self.topology, &expected).await?;

        let pair = HaPair::resolve(&self.topology, &self.config.roles.namenode)?;
        info!(%pair, "HA labels discovered");
        self.pair = Some(pair);
        self.log.record(ScenarioPhase::Setup);
        Ok(())
    }

    pub async fn verify_components(&mut self) -> Result<()> {
        let pair = self.require_pair()?.clone();
        self.components.verify(&mut self.topology, &pair).await
    }

    pub async fn prepare_hdfs_directories(&self) -> Result<()> {
        self.workload.prepare_hdfs_directories(&self.client()?).await
    }

    /// Writes the test file and reads it straight back.
    pub async fn write_artifact(&self) -> Result<()> {
        let client = self.client()?;
        self.workload.write_artifact(&client).await?;
        self.workload.read_artifact(&client).await
    }

    /// Whether the test file can be read back. A failed read or wrong
    /// contents mean `false`; failing to reach the fleet is an error.
    pub async fn artifact_readable(&self) -> Result<bool> {
        match self.workload.read_artifact(&self.client()?).await {
            Ok(()) => Ok(true),
            Err(Error::Command(_)) | Err(Error::Verification(VerificationError::ArtifactMismatch { .. })) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Writes the test file unless it can already be read back, so HA
    /// operations can run on their own.
    pub async fn ensure_artifact(&self) -> Result<()> {
        if self.artifact_readable().await? {
            return Ok(());
        }
        info!("test file missing, writing it first");
        self.prepare_hdfs_directories().await?;
        self.write_artifact().await
    }

    pub async fn run_workload(&self) -> Result<()> {
        self.workload.run_mapreduce(&self.client()?).await
    }

    pub async fn run_failover(&mut self) -> Result<()> {
        let mut pair = self.require_pair()?.clone();
        self.failover.run(&mut self.topology, &mut pair).await?;
        self.pair = Some(pair);
        Ok(())
    }

    pub async fn run_upgrade(&mut self) -> Result<()> {
        let pair = self.require_pair()?.clone();
        self.upgrade.run(&mut self.topology, &pair).await?;
        Ok(())
    }

    /// One observation of every versioned role against the steady fleet.
    pub async fn status_report(&mut self) -> Result<StatusDiff> {
        let expected = self.catalog()?.steady_fleet(&self.config.roles);
        let observed = self.waiter.observe(&mut self.topology, &expected).await?;
        Ok(status::diff(&observed, &expected))
    }

    fn catalog(&self) -> Result<StatusCatalog> {
        StatusCatalog::for_topology(
            &self.topology,
            &self.config.roles,
            &self.config.upgrade.spec_component,
        )
    }

    fn client(&self) -> Result<String> {
        Ok(self.topology.first_unit(&self.config.roles.client)?.name().to_string())
    }

    fn require_pair(&self) -> Result<&HaPair> {
        self.pair.as_ref().ok_or_else(|| {
            VerificationError::PhaseOrder {
                requested: "HA operations".to_string(),
                required: ScenarioPhase::Setup.to_string(),
            }
            .into()
        })
    }
}
