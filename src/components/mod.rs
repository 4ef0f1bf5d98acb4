//! Process identity checks.
//!
//! Each service must run exactly where its role says: the NameNode only on
//! the Active and Standby NameNodes, ResourceManager and JobHistoryServer only on the
//! ResourceManager, NodeManager and DataNode only on workers, and nothing on
//! the client.


use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::instrument;

use crate::constants::*;
use crate::ClusterController;
use crate::CommandError;
use crate::HaPair;
use crate::Result;
use crate::RoleNames;
use crate::Topology;
use crate::VerificationError;

/// Where each process marker is expected, by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    NameNode,
    ResourceManager,
    Worker,
}

const PROCESS_OWNERS: [(&str, Owner); 5] = [
    (PROCESS_NAMENODE, Owner::NameNode),
    (PROCESS_RESOURCEMANAGER, Owner::ResourceManager),
    (PROCESS_JOBHISTORY, Owner::ResourceManager),
    (PROCESS_NODEMANAGER, Owner::Worker),
    (PROCESS_DATANODE, Owner::Worker),
];

/// One unit probed for running processes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub unit: String,
    owner: Option<Owner>,
}

impl Probe {
    /// Process markers that must appear on this unit
    pub fn required(&self) -> Vec<&'static str> {
        PROCESS_OWNERS
            .iter()
            .filter(|(_, owner)| Some(*owner) == self.owner)
            .map(|(process, _)| *process)
            .collect()
    }

    /// Process markers that must not appear on this unit
    pub fn forbidden(&self) -> Vec<&'static str> {
        PROCESS_OWNERS
            .iter()
            .filter(|(_, owner)| Some(*owner) != self.owner)
            .map(|(process, _)| *process)
            .collect()
    }
}

pub struct ComponentVerifier<C: ClusterController> {
    controller: Arc<C>,
    roles: RoleNames,
}

impl<C: ClusterController> ComponentVerifier<C> {
    pub fn new(
        controller: Arc<C>,
        roles: RoleNames,
    ) -> Self {
        Self { controller, roles }
    }

    /// Both NameNodes, first ResourceManager, first worker and first client.
    pub fn probes(
        &self,
        topology: &Topology,
        pair: &HaPair,
    ) -> Result<Vec<Probe>> {
        Ok(vec![
            Probe {
                unit: topology.unit(&pair.active)?.name().to_string(),
                owner: Some(Owner::NameNode),
            },
            Probe {
                unit: topology.unit(&pair.standby)?.name().to_string(),
                owner: Some(Owner::NameNode),
            },
            Probe {
                unit: topology.first_unit(&self.roles.resourcemanager)?.name().to_string(),
                owner: Some(Owner::ResourceManager),
            },
            Probe {
                unit: topology.first_unit(&self.roles.worker)?.name().to_string(),
                owner: Some(Owner::Worker),
            },
            Probe {
                unit: topology.first_unit(&self.roles.client)?.name().to_string(),
                owner: None,
            },
        ])
    }

    /// Lists java processes on every probe and checks presence and absence.
    ///
    /// Observed markers are recorded on the topology's units.
    #[instrument(skip(self, topology), fields(pair = %pair))]
    pub async fn verify(
        &self,
        topology: &mut Topology,
        pair: &HaPair,
    ) -> Result<()> {
        for probe in self.probes(topology, pair)? {
            let running = self.list_processes(&probe.unit).await?;
            debug!(unit = %probe.unit, ?running, "java processes");

            for process in probe.required() {
                if !running.contains(process) {
                    return Err(VerificationError::ProcessMissing {
                        unit: probe.unit.clone(),
                        process: process.to_string(),
                    }
                    .into());
                }
            }
            for process in probe.forbidden() {
                if running.contains(process) {
                    return Err(VerificationError::ProcessUnexpected {
                        unit: probe.unit.clone(),
                        process: process.to_string(),
                    }
                    .into());
                }
            }
            topology.record_processes(&probe.unit, running)?;
        }
        info!("all components running where expected");
        Ok(())
    }

    async fn list_processes(
        &self,
        unit: &str,
    ) -> Result<BTreeSet<String>> {
        let out = self.controller.exec(unit, LIST_JAVA_PROCESSES).await?;
        // pgrep exits 1 when nothing matched
        if !out.success() && !(out.exit_code == 1 && out.output.trim().is_empty()) {
            return Err(CommandError::Failed {
                step: "list java processes".to_string(),
                unit: unit.to_string(),
                exit_code: out.exit_code,
                output: out.output,
            }
            .into());
        }
        Ok(process_markers(&out.output))
    }
}

/// Known process markers found in a `pgrep -a java` listing
pub(crate) fn process_markers(listing: &str) -> BTreeSet<String> {
    PROCESS_OWNERS
        .iter()
        .map(|(process, _)| *process)
        .filter(|process| listing.contains(process))
        .map(str::to_string)
        .collect()
}
