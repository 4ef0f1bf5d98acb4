use std::fmt;

use crate::HaPair;
use crate::Result;
use crate::RoleNames;
use crate::Topology;
use crate::TopologyError;
use crate::UnitName;

/// Named boundaries of the rolling upgrade, in execution order.
///
/// Each phase names the state reached once its step completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UpgradePhase {
    /// Every versioned role declares the target version
    Reconfigured,
    /// `query` reported the upgrade image ready
    ImagePrepared,
    StandbyNameNodeUpgraded,
    ActiveNameNodeUpgraded,
    ResourceManagerUpgraded,
    PluginsUpgraded,
    WorkerSubsetUpgraded,
    /// Upgraded units steady-ready, held-back workers in spec mismatch
    MixedVersionVerified,
    WorkersCompleted,
    PluginDowngraded,
    PluginRestored,
    Finalized,
}

impl UpgradePhase {
    pub const ALL: [UpgradePhase; 12] = [
        UpgradePhase::Reconfigured,
        UpgradePhase::ImagePrepared,
        UpgradePhase::StandbyNameNodeUpgraded,
        UpgradePhase::ActiveNameNodeUpgraded,
        UpgradePhase::ResourceManagerUpgraded,
        UpgradePhase::PluginsUpgraded,
        UpgradePhase::WorkerSubsetUpgraded,
        UpgradePhase::MixedVersionVerified,
        UpgradePhase::WorkersCompleted,
        UpgradePhase::PluginDowngraded,
        UpgradePhase::PluginRestored,
        UpgradePhase::Finalized,
    ];
}

impl fmt::Display for UpgradePhase {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Which unit gets which action, fixed before anything is touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePlan {
    pub active_namenode: UnitName,
    pub standby_namenode: UnitName,
    pub resourcemanagers: Vec<UnitName>,
    pub plugins: Vec<UnitName>,
    /// Workers upgraded before the mixed-version check
    pub upgraded_workers: Vec<UnitName>,
    /// Workers deliberately left on the original version until the check
    pub held_back_workers: Vec<UnitName>,
}

impl UpgradePlan {
    /// Holds back the last `held_back` workers. At least one worker must be
    /// upgraded in the first pass.
    pub fn new(
        topology: &Topology,
        roles: &RoleNames,
        pair: &HaPair,
        held_back: usize,
    ) -> Result<Self> {
        let workers = topology.unit_names(&roles.worker)?;
        if held_back == 0 || held_back >= workers.len() {
            return Err(TopologyError::NotEnoughUnits {
                role: roles.worker.clone(),
                required: held_back.max(1) + 1,
                found: workers.len(),
            }
            .into());
        }
        topology.unit(&pair.active)?;
        topology.unit(&pair.standby)?;

        let split = workers.len() - held_back;
        Ok(Self {
            active_namenode: pair.active.clone(),
            standby_namenode: pair.standby.clone(),
            resourcemanagers: topology.unit_names(&roles.resourcemanager)?,
            plugins: topology.unit_names(&roles.plugin)?,
            upgraded_workers: workers[..split].to_vec(),
            held_back_workers: workers[split..].to_vec(),
        })
    }

    /// Plugin unit used for the downgrade/upgrade toggle
    pub fn toggle_plugin(&self) -> &str {
        // new() fails on an empty plugin role
        self.plugins.first().map(String::as_str).unwrap_or_default()
    }

    /// Units receiving `upgrade` in the first pass, in order
    pub fn first_pass(&self) -> Vec<&str> {
        let mut order = vec![self.standby_namenode.as_str(), self.active_namenode.as_str()];
        order.extend(self.resourcemanagers.iter().map(String::as_str));
        order.extend(self.plugins.iter().map(String::as_str));
        order.extend(self.upgraded_workers.iter().map(String::as_str));
        order
    }
}
