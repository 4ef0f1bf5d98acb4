use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tracing::debug;

use super::SimulationOptions;
use crate::constants::*;
use crate::ActionResult;
use crate::CommandOutput;
use crate::HaReport;
use crate::RoleNames;
use crate::SpecPeer;
use crate::StatusCatalog;
use crate::StatusMessage;
use crate::UnitName;
use crate::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoleKind {
    NameNode,
    ResourceManager,
    Worker,
    Plugin,
    Client,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NameNodeState {
    running: bool,
    active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImageState {
    Absent,
    /// Becomes ready after this many further `query` calls
    Preparing(usize),
    Ready,
    Finalized,
}

/// Deployed software state of the simulated fleet
#[derive(Debug)]
pub(crate) struct FleetModel {
    roles: RoleNames,
    catalog: StatusCatalog,
    version_key: String,
    prepare_queries: usize,
    members: BTreeMap<String, Vec<UnitName>>,
    installed: BTreeMap<UnitName, Version>,
    configured: BTreeMap<String, Version>,
    settings: BTreeMap<(String, String), String>,
    namenodes: BTreeMap<UnitName, NameNodeState>,
    image: ImageState,
    /// Units whose actions report completion without doing anything
    inert: BTreeSet<UnitName>,
}

impl FleetModel {
    pub(crate) fn new(
        roles: RoleNames,
        spec_component: &str,
        version_key: &str,
        options: &SimulationOptions,
        members: BTreeMap<String, Vec<UnitName>>,
        versions: BTreeMap<String, Version>,
    ) -> Self {
        let workers = members.get(&roles.worker).map_or(0, Vec::len);
        let mut installed = BTreeMap::new();
        for (role, units) in &members {
            if let Some(version) = versions.get(role) {
                for unit in units {
                    installed.insert(unit.clone(), version.clone());
                }
            }
        }
        let namenodes = members
            .get(&roles.namenode)
            .map(|units| {
                units
                    .iter()
                    .enumerate()
                    .map(|(i, unit)| {
                        (
                            unit.clone(),
                            NameNodeState {
                                running: true,
                                active: i == options.initial_active % units.len(),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            catalog: StatusCatalog::new(workers, spec_component),
            roles,
            version_key: version_key.to_string(),
            prepare_queries: options.prepare_queries,
            members,
            installed,
            configured: versions,
            settings: BTreeMap::new(),
            namenodes,
            image: ImageState::Absent,
            inert: options.inert_units.clone(),
        }
    }

    pub(crate) fn role_of(
        &self,
        unit: &str,
    ) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, units)| units.iter().any(|u| u == unit))
            .map(|(role, _)| role.as_str())
    }

    pub(crate) fn units(
        &self,
        role: &str,
    ) -> &[UnitName] {
        self.members.get(role).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn installed(
        &self,
        unit: &str,
    ) -> Option<&Version> {
        self.installed.get(unit)
    }

    pub(crate) fn image(&self) -> ImageState {
        self.image
    }

    fn kind(
        &self,
        role: &str,
    ) -> RoleKind {
        let r = &self.roles;
        if role == r.namenode {
            RoleKind::NameNode
        } else if role == r.resourcemanager {
            RoleKind::ResourceManager
        } else if role == r.worker {
            RoleKind::Worker
        } else if role == r.plugin {
            RoleKind::Plugin
        } else if role == r.client {
            RoleKind::Client
        } else {
            RoleKind::Other
        }
    }

    /// True while some NameNode is running as Active
    pub(crate) fn serving(&self) -> bool {
        self.namenodes.values().any(|n| n.running && n.active)
    }

    pub(crate) fn configure(
        &mut self,
        role: &str,
        key: &str,
        value: &str,
    ) {
        if key == self.version_key {
            self.configured.insert(role.to_string(), Version::new(value));
        } else {
            self.settings
                .insert((role.to_string(), key.to_string()), value.to_string());
        }
    }

    /// Version the peers compare against: the serving NameNode's, else any.
    fn namenode_version(&self) -> Option<&Version> {
        self.namenodes
            .iter()
            .find(|(_, n)| n.running && n.active)
            .or_else(|| self.namenodes.iter().next())
            .and_then(|(unit, _)| self.installed.get(unit))
    }

    fn resourcemanager_version(&self) -> Option<&Version> {
        self.units(&self.roles.resourcemanager)
            .first()
            .and_then(|unit| self.installed.get(unit))
    }

    fn mismatch(
        &self,
        unit: &str,
        peers: &[SpecPeer],
    ) -> Option<StatusMessage> {
        let local = self.installed.get(unit)?;
        peers.iter().find_map(|peer| {
            let remote = match peer {
                SpecPeer::NameNode => self.namenode_version(),
                SpecPeer::ResourceManager => self.resourcemanager_version(),
            }?;
            (remote != local).then(|| self.catalog.spec_mismatch_message(*peer, local, remote))
        })
    }

    fn namenode_status(
        &self,
        unit: &str,
    ) -> StatusMessage {
        let Some(own) = self.namenodes.get(unit) else {
            return "Unknown NameNode".to_string();
        };
        let peer_running = self
            .namenodes
            .iter()
            .any(|(name, n)| name != unit && n.running);
        let report = match (own.running, peer_running, own.active) {
            (false, _, _) => HaReport::DegradedDown,
            (true, false, _) => HaReport::DegradedActive,
            (true, true, true) => HaReport::Active,
            (true, true, false) => HaReport::Standby,
        };
        self.catalog.namenode(report)
    }

    /// What `unit` would report right now.
    pub(crate) fn status(
        &self,
        unit: &str,
    ) -> StatusMessage {
        let role = self.role_of(unit).unwrap_or_default();
        match self.kind(role) {
            RoleKind::NameNode => self.namenode_status(unit),
            RoleKind::ResourceManager => self
                .mismatch(unit, &[SpecPeer::NameNode])
                .unwrap_or_else(|| self.catalog.resourcemanager_ready()),
            RoleKind::Worker => self
                .mismatch(unit, &[SpecPeer::NameNode, SpecPeer::ResourceManager])
                .unwrap_or_else(|| self.catalog.worker_ready()),
            RoleKind::Plugin => self
                .mismatch(unit, &[SpecPeer::NameNode, SpecPeer::ResourceManager])
                .unwrap_or_else(|| self.catalog.plugin_ready()),
            RoleKind::Client | RoleKind::Other => "Ready".to_string(),
        }
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<UnitName, StatusMessage> {
        self.members
            .values()
            .flatten()
            .map(|unit| (unit.clone(), self.status(unit)))
            .collect()
    }

    /// `pgrep -a java` as seen on `unit`
    pub(crate) fn java_processes(
        &self,
        unit: &str,
    ) -> CommandOutput {
        const JVM: &str = "/usr/lib/jvm/java-8-openjdk-amd64/bin/java";
        let role = self.role_of(unit).unwrap_or_default();
        let lines: Vec<String> = match self.kind(role) {
            RoleKind::NameNode if self.namenodes.get(unit).is_some_and(|n| n.running) => vec![
                format!("2143 {JVM} -Dproc_namenode org.apache.hadoop.hdfs.server.namenode.NameNode"),
                format!("2388 {JVM} -Dproc_zkfc org.apache.hadoop.hdfs.tools.DFSZKFailoverController"),
            ],
            RoleKind::ResourceManager => vec![
                format!("3011 {JVM} -Dproc_resourcemanager org.apache.hadoop.yarn.server.resourcemanager.ResourceManager"),
                format!("3290 {JVM} -Dproc_historyserver org.apache.hadoop.mapreduce.v2.hs.JobHistoryServer"),
            ],
            RoleKind::Worker => vec![
                format!("1822 {JVM} -Dproc_datanode org.apache.hadoop.hdfs.server.datanode.DataNode"),
                format!("1950 {JVM} -Dproc_nodemanager org.apache.hadoop.yarn.server.nodemanager.NodeManager"),
            ],
            _ => Vec::new(),
        };
        if lines.is_empty() {
            CommandOutput::new("", 1)
        } else {
            CommandOutput::new(lines.join("\n"), 0)
        }
    }

    /// Applies one action and reports what the unit's agent would report.
    pub(crate) fn apply(
        &mut self,
        unit: &str,
        name: &str,
    ) -> ActionResult {
        if self.inert.contains(unit) {
            debug!(unit, name, "inert unit ignores action");
            return completed(BTreeMap::new());
        }
        let role = self.role_of(unit).unwrap_or_default().to_string();
        let is_namenode = self.kind(&role) == RoleKind::NameNode;

        match name {
            ACTION_STOP_NAMENODE | ACTION_START_NAMENODE | ACTION_PREPARE_UPGRADE | ACTION_QUERY
            | ACTION_FINALIZE
                if !is_namenode =>
            {
                failed(format!("{name} is only available on NameNode units"))
            }
            ACTION_STOP_NAMENODE => {
                for (other, state) in self.namenodes.iter_mut() {
                    if other == unit {
                        *state = NameNodeState {
                            running: false,
                            active: false,
                        };
                    } else if state.running {
                        state.active = true;
                    }
                }
                completed(BTreeMap::new())
            }
            ACTION_START_NAMENODE => {
                let peer_active = self
                    .namenodes
                    .iter()
                    .any(|(other, n)| other != unit && n.running && n.active);
                if let Some(state) = self.namenodes.get_mut(unit) {
                    *state = NameNodeState {
                        running: true,
                        active: !peer_active,
                    };
                }
                completed(BTreeMap::new())
            }
            ACTION_PREPARE_UPGRADE => {
                if !self.namenodes.get(unit).is_some_and(|n| n.running && n.active) {
                    return failed(format!("{unit} is not the active NameNode"));
                }
                self.image = ImageState::Preparing(self.prepare_queries);
                completed(BTreeMap::new())
            }
            ACTION_QUERY => {
                let ready = match self.image {
                    ImageState::Preparing(0) | ImageState::Ready => {
                        self.image = ImageState::Ready;
                        true
                    }
                    ImageState::Preparing(left) => {
                        self.image = ImageState::Preparing(left - 1);
                        false
                    }
                    ImageState::Absent | ImageState::Finalized => false,
                };
                let value = if ready { "True" } else { "False" };
                completed(BTreeMap::from([(READY_FIELD.to_string(), value.to_string())]))
            }
            ACTION_UPGRADE | ACTION_DOWNGRADE => {
                let Some(target) = self.configured.get(&role).cloned() else {
                    return failed(format!("{} is not configured for {role}", self.version_key));
                };
                let changes = self.installed.get(unit) != Some(&target);
                if is_namenode && changes && self.image != ImageState::Ready {
                    return failed("upgrade image is not ready; run prepare-upgrade first".to_string());
                }
                self.installed.insert(unit.to_string(), target);
                completed(BTreeMap::new())
            }
            ACTION_FINALIZE => {
                if self.image != ImageState::Ready {
                    return failed("no upgrade in progress".to_string());
                }
                self.image = ImageState::Finalized;
                completed(BTreeMap::new())
            }
            other => failed(format!("unknown action {other}")),
        }
    }
}

fn completed(fields: BTreeMap<String, String>) -> ActionResult {
    ActionResult {
        completed: true,
        failure: None,
        fields,
    }
}

fn failed(message: String) -> ActionResult {
    ActionResult {
        completed: true,
        failure: Some(message),
        fields: BTreeMap::new(),
    }
}
