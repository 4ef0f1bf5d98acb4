//! Upgrade Orchestrator
//!
//! Rolling upgrade of the whole fleet to the configured target version, with
//! a deliberate partial stop to prove mixed-version tolerance and a plugin
//! downgrade/upgrade toggle. Convergence failures are fatal and nothing is
//! rolled back.
//!
//! Steps, each ending at an [`UpgradePhase`]:
//! 1. declare the target version on every versioned role (intent only)
//! 2. `prepare-upgrade` on the Active NameNode, then poll `query` until ready
//! 3. `upgrade` the Standby NameNode, the Active NameNode, the
//!    ResourceManager, every plugin unit and all but the held-back workers
//! 4. await the mixed state: held-back workers report a spec mismatch
//! 5. upgrade the held-back workers and await the steady fleet
//! 6. plugin toggle: original version + `downgrade`, await mismatch, target
//!    version + `downgrade`, await ready
//! 7. `finalize` on the Active NameNode and read the artifact back

mod plan;
pub use plan::*;


use std::sync::Arc;

use tracing::info;
use tracing::instrument;

use crate::constants::*;
use crate::utils::CheckpointLog;
use crate::ActionCoordinator;
use crate::ClusterController;
use crate::ConvergenceWaiter;
use crate::Expectation;
use crate::FleetExpectation;
use crate::HaPair;
use crate::HarnessConfig;
use crate::MessageForm;
use crate::Result;
use crate::RoleNames;
use crate::StatusCatalog;
use crate::Topology;
use crate::UpgradeConfig;
use crate::VerificationError;
use crate::Version;
use crate::WorkloadVerifier;

pub struct UpgradeOrchestrator<C: ClusterController> {
    controller: Arc<C>,
    waiter: ConvergenceWaiter<C>,
    actions: ActionCoordinator<C>,
    workload: WorkloadVerifier<C>,
    roles: RoleNames,
    config: UpgradeConfig,
}

impl<C: ClusterController> UpgradeOrchestrator<C> {
    pub fn new(
        controller: Arc<C>,
        config: &HarnessConfig,
    ) -> Self {
        Self {
            waiter: ConvergenceWaiter::new(controller.clone(), config.convergence),
            actions: ActionCoordinator::new(controller.clone(), config.actions),
            workload: WorkloadVerifier::new(controller.clone(), config.workload.clone()),
            controller,
            roles: config.roles.clone(),
            config: config.upgrade.clone(),
        }
    }

    pub fn plan(
        &self,
        topology: &Topology,
        pair: &HaPair,
    ) -> Result<UpgradePlan> {
        UpgradePlan::new(topology, &self.roles, pair, self.config.held_back_workers)
    }

    pub async fn run(
        &self,
        topology: &mut Topology,
        pair: &HaPair,
    ) -> Result<CheckpointLog<UpgradePhase>> {
        self.run_from(topology, pair, UpgradePhase::Reconfigured).await
    }

    /// Runs every step from the one ending at `from` onwards.
    ///
    /// Resuming past [`UpgradePhase::Reconfigured`] requires the topology to
    /// already declare the target version on every versioned role.
    #[instrument(skip(self, topology, pair), fields(pair = %pair))]
    pub async fn run_from(
        &self,
        topology: &mut Topology,
        pair: &HaPair,
        from: UpgradePhase,
    ) -> Result<CheckpointLog<UpgradePhase>> {
        let plan = self.plan(topology, pair)?;
        let catalog = StatusCatalog::for_topology(topology, &self.roles, &self.config.spec_component)?;
        let original = self.config.original();
        let target = self.config.target();
        let client = topology.first_unit(&self.roles.client)?.name().to_string();

        if from > UpgradePhase::Reconfigured {
            self.require_declared(topology, &target, from)?;
        }

        let mut log = CheckpointLog::new();
        for phase in UpgradePhase::ALL.into_iter().filter(|p| *p >= from) {
            match phase {
                UpgradePhase::Reconfigured => {
                    for role in self.roles.versioned() {
                        self.declare(topology, role, &target).await?;
                    }
                }
                UpgradePhase::ImagePrepared => {
                    self.actions
                        .run_checked(&plan.active_namenode, ACTION_PREPARE_UPGRADE)
                        .await?;
                    self.actions
                        .await_flag(&plan.active_namenode, ACTION_QUERY, READY_FIELD)
                        .await?;
                }
                UpgradePhase::StandbyNameNodeUpgraded => {
                    self.upgrade(&plan.standby_namenode).await?;
                }
                UpgradePhase::ActiveNameNodeUpgraded => {
                    self.upgrade(&plan.active_namenode).await?;
                }
                UpgradePhase::ResourceManagerUpgraded => {
                    for unit in &plan.resourcemanagers {
                        self.upgrade(unit).await?;
                    }
                }
                UpgradePhase::PluginsUpgraded => {
                    for unit in &plan.plugins {
                        self.upgrade(unit).await?;
                    }
                }
                UpgradePhase::WorkerSubsetUpgraded => {
                    for unit in &plan.upgraded_workers {
                        self.upgrade(unit).await?;
                    }
                    info!(held_back = ?plan.held_back_workers, "workers held back");
                }
                UpgradePhase::MixedVersionVerified => {
                    let expected = self.mixed_version_expectation(&catalog, &plan, &original, &target)?;
                    self.waiter.await_state(topology, &expected).await?;
                }
                UpgradePhase::WorkersCompleted => {
                    for unit in &plan.held_back_workers {
                        self.upgrade(unit).await?;
                    }
                    self.waiter
                        .await_state(topology, &catalog.steady_fleet(&self.roles))
                        .await?;
                }
                UpgradePhase::PluginDowngraded => {
                    self.declare(topology, &self.roles.plugin, &original).await?;
                    self.actions.run_checked(plan.toggle_plugin(), ACTION_DOWNGRADE).await?;
                    let expected = self.plugin_toggle_expectation(&catalog, &plan, &original, &target)?;
                    self.waiter.await_state(topology, &expected).await?;
                }
                UpgradePhase::PluginRestored => {
                    self.declare(topology, &self.roles.plugin, &target).await?;
                    self.actions.run_checked(plan.toggle_plugin(), ACTION_DOWNGRADE).await?;
                    let expected = FleetExpectation::new()
                        .role(&self.roles.plugin, Expectation::exact(catalog.plugin_ready()));
                    self.waiter.await_state(topology, &expected).await?;
                }
                UpgradePhase::Finalized => {
                    self.actions
                        .run_checked(&plan.active_namenode, ACTION_FINALIZE)
                        .await?;
                    self.workload.read_artifact(&client).await?;
                }
            }
            log.record(phase);
        }
        info!(version = %target, "rolling upgrade complete");
        Ok(log)
    }

    /// Upgraded roles steady-ready; exactly the held-back workers in spec
    /// mismatch, matched by pattern on the live version pair.
    pub fn mixed_version_expectation(
        &self,
        catalog: &StatusCatalog,
        plan: &UpgradePlan,
        original: &Version,
        target: &Version,
    ) -> Result<FleetExpectation> {
        let mismatch = catalog.spec_mismatch(original, target)?;
        let mut workers: Vec<MessageForm> = plan
            .upgraded_workers
            .iter()
            .map(|_| MessageForm::from(catalog.worker_ready()))
            .collect();
        workers.extend(plan.held_back_workers.iter().map(|_| mismatch.clone()));

        Ok(FleetExpectation::new()
            .role(&self.roles.namenode, catalog.ha_steady())
            .role(
                &self.roles.resourcemanager,
                Expectation::exact(catalog.resourcemanager_ready()),
            )
            .role(&self.roles.plugin, Expectation::exact(catalog.plugin_ready()))
            .role(&self.roles.worker, Expectation::AnyOf(workers)))
    }

    /// The toggled plugin unit in spec mismatch, any others still ready.
    pub fn plugin_toggle_expectation(
        &self,
        catalog: &StatusCatalog,
        plan: &UpgradePlan,
        original: &Version,
        target: &Version,
    ) -> Result<FleetExpectation> {
        let mismatch = catalog.spec_mismatch(original, target)?;
        let expectation = if plan.plugins.len() == 1 {
            Expectation::OneOf(vec![mismatch])
        } else {
            let mut forms = vec![mismatch];
            forms.extend((1..plan.plugins.len()).map(|_| MessageForm::from(catalog.plugin_ready())));
            Expectation::AnyOf(forms)
        };
        Ok(FleetExpectation::new().role(&self.roles.plugin, expectation))
    }

    async fn declare(
        &self,
        topology: &mut Topology,
        role: &str,
        version: &Version,
    ) -> Result<()> {
        info!(role, %version, "declaring version");
        self.controller
            .configure(role, &self.config.version_key, version.as_str())
            .await?;
        topology.declare_version(role, version.clone());
        Ok(())
    }

    async fn upgrade(
        &self,
        unit: &str,
    ) -> Result<()> {
        info!(unit, "upgrading");
        self.actions.run_checked(unit, ACTION_UPGRADE).await?;
        Ok(())
    }

    fn require_declared(
        &self,
        topology: &Topology,
        target: &Version,
        from: UpgradePhase,
    ) -> Result<()> {
        for role in self.roles.versioned() {
            // the plugin may legitimately sit on the original version mid-toggle
            if role == self.roles.plugin && from == UpgradePhase::PluginRestored {
                continue;
            }
            if topology.version(role) != Some(target) {
                return Err(VerificationError::PhaseOrder {
                    requested: from.to_string(),
                    required: UpgradePhase::Reconfigured.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}
