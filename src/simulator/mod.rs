//! In-process model of an HA Hadoop fleet.
//!
//! [`SimulatedCluster`] implements [`ClusterController`] without any real
//! infrastructure: a NameNode pair with automatic fail-over, spec-mismatch
//! reporting derived from installed versions, upgrade image preparation that
//! takes several `query` calls, and an in-memory HDFS for the workload
//! commands. Status changes become visible only after a configurable number
//! of status reads, so callers have to poll for them like they would on a
//! real fleet.

mod fleet;
mod hdfs;

#[cfg(test)]
mod simulator_test;

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use fleet::FleetModel;
use hdfs::HdfsModel;
use parking_lot::Mutex;
use tracing::debug;
use tracing::instrument;

use crate::constants::LIST_JAVA_PROCESSES;
use crate::ActionHandle;
use crate::ActionParams;
use crate::ActionResult;
use crate::ClusterController;
use crate::CommandOutput;
use crate::ControllerError;
use crate::HarnessConfig;
use crate::Result;
use crate::StatusMessage;
use crate::Topology;
use crate::UnitName;
use crate::Version;

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    /// Status reads that still return the previous snapshot after a change
    pub status_lag: usize,
    /// `query` calls answered with `ready: False` after `prepare-upgrade`
    pub prepare_queries: usize,
    /// Index of the NameNode unit that starts as Active
    pub initial_active: usize,
    /// Units that accept actions but never act on them
    pub inert_units: BTreeSet<UnitName>,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            status_lag: 1,
            prepare_queries: 2,
            initial_active: 0,
            inert_units: BTreeSet::new(),
        }
    }
}

struct SimulatorState {
    fleet: FleetModel,
    hdfs: HdfsModel,
    published: BTreeMap<UnitName, StatusMessage>,
    stale_reads: usize,
    results: BTreeMap<String, ActionResult>,
    history: Vec<(UnitName, String)>,
}

pub struct SimulatedCluster {
    state: Mutex<SimulatorState>,
    status_lag: usize,
}

impl SimulatedCluster {
    /// Models `topology` as deployed at its declared versions. Roles without
    /// a declared version run the configured original version.
    pub fn new(
        topology: &Topology,
        config: &HarnessConfig,
        options: SimulationOptions,
    ) -> Result<Self> {
        let mut members = BTreeMap::new();
        let mut versions = BTreeMap::new();
        for role in topology.role_names() {
            members.insert(role.to_string(), topology.unit_names(role)?);
            let version = match topology.version(role) {
                Some(version) => Some(version.clone()),
                None if config.roles.versioned().contains(&role) => Some(config.upgrade.original()),
                None => None,
            };
            if let Some(version) = version {
                versions.insert(role.to_string(), version);
            }
        }

        let fleet = FleetModel::new(
            config.roles.clone(),
            &config.upgrade.spec_component,
            &config.upgrade.version_key,
            &options,
            members,
            versions,
        );
        let published = fleet.snapshot();

        Ok(Self {
            state: Mutex::new(SimulatorState {
                fleet,
                hdfs: HdfsModel::new(&config.workload.superuser),
                published,
                stale_reads: 0,
                results: BTreeMap::new(),
                history: Vec::new(),
            }),
            status_lag: options.status_lag,
        })
    }

    /// Every action invoked so far, in order, as `(unit, action)`
    pub fn action_log(&self) -> Vec<(UnitName, String)> {
        self.state.lock().history.clone()
    }

    pub fn installed_version(
        &self,
        unit: &str,
    ) -> Option<Version> {
        self.state.lock().fleet.installed(unit).cloned()
    }

    /// Whether `path` exists in the simulated HDFS namespace
    pub fn hdfs_exists(
        &self,
        path: &str,
    ) -> bool {
        self.state.lock().hdfs.exists(path)
    }

    /// Status every unit would report once publication catches up
    pub fn live_status(&self) -> BTreeMap<UnitName, StatusMessage> {
        self.state.lock().fleet.snapshot()
    }

    /// True once `prepare-upgrade` has been queried to completion and the
    /// upgrade has not been finalized yet
    pub fn upgrade_image_ready(&self) -> bool {
        self.state.lock().fleet.image() == fleet::ImageState::Ready
    }

    pub fn upgrade_finalized(&self) -> bool {
        self.state.lock().fleet.image() == fleet::ImageState::Finalized
    }

    fn known_unit(
        state: &SimulatorState,
        unit: &str,
    ) -> Result<()> {
        match state.fleet.role_of(unit) {
            Some(_) => Ok(()),
            None => Err(ControllerError::UnknownUnit(unit.to_string()).into()),
        }
    }
}

#[async_trait]
impl ClusterController for SimulatedCluster {
    #[instrument(skip(self))]
    async fn exec(
        &self,
        unit: &str,
        command: &str,
    ) -> Result<CommandOutput> {
        let mut state = self.state.lock();
        Self::known_unit(&state, unit)?;

        if command == LIST_JAVA_PROCESSES {
            return Ok(state.fleet.java_processes(unit));
        }
        let (identity, script) = split_identity(command);
        let serving = state.fleet.serving();
        let out = state.hdfs.run(unit, identity, script, serving);
        debug!(exit_code = out.exit_code, "simulated command finished");
        Ok(out)
    }

    async fn invoke_action(
        &self,
        unit: &str,
        name: &str,
        _params: &ActionParams,
    ) -> Result<ActionHandle> {
        let mut state = self.state.lock();
        Self::known_unit(&state, unit)?;

        let result = state.fleet.apply(unit, name);
        let handle = ActionHandle {
            id: nanoid::nanoid!(),
            unit: unit.to_string(),
            name: name.to_string(),
        };
        debug!(%handle, ?result, "simulated action applied");
        state.results.insert(handle.id.clone(), result);
        state.history.push((unit.to_string(), name.to_string()));
        state.stale_reads = self.status_lag;
        Ok(handle)
    }

    async fn fetch_result(
        &self,
        handle: &ActionHandle,
        _timeout: Duration,
    ) -> Result<ActionResult> {
        self.state
            .lock()
            .results
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| ControllerError::UnknownHandle(handle.id.clone()).into())
    }

    async fn current_status(
        &self,
        role: &str,
    ) -> Result<BTreeMap<UnitName, StatusMessage>> {
        let mut state = self.state.lock();
        if state.stale_reads > 0 {
            state.stale_reads -= 1;
        } else {
            state.published = state.fleet.snapshot();
        }
        let units = state.fleet.units(role);
        Ok(state
            .published
            .iter()
            .filter(|(unit, _)| units.contains(unit))
            .map(|(unit, message)| (unit.clone(), message.clone()))
            .collect())
    }

    async fn configure(
        &self,
        role: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        debug!(role, key, value, "simulated configuration change");
        self.state.lock().fleet.configure(role, key, value);
        Ok(())
    }
}

/// Splits `su <identity> -c '<script>'`; anything else runs as root.
fn split_identity(command: &str) -> (&str, &str) {
    command
        .strip_prefix("su ")
        .and_then(|rest| rest.split_once(" -c '"))
        .and_then(|(identity, script)| script.strip_suffix('\'').map(|script| (identity, script)))
        .unwrap_or(("root", command))
}
