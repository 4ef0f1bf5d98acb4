//! Deployed fleet layout.
//!
//! A [`Topology`] is built once from a [`TopologyDocument`] and lives for the
//! whole scenario. Role membership never changes; units only learn what was
//! last observed about them (status text, running processes).

mod document;
mod unit;
pub use document::*;
pub use unit::*;

#[cfg(test)]
mod topology_test;

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::Result;
use crate::RoleNames;
use crate::TopologyError;

/// Free text reported by a unit's control agent
pub type StatusMessage = String;

/// Unit identifier, e.g. `namenode/0`
pub type UnitName = String;

/// Mapping from role name to its ordered units, plus declared per-role versions
#[derive(Debug, Clone, Default)]
pub struct Topology {
    roles: BTreeMap<String, Vec<Unit>>,
    versions: BTreeMap<String, Version>,
}

impl Topology {
    /// Parses a YAML topology document and builds the topology from it.
    pub fn load(yaml: &str) -> Result<Self> {
        let document = TopologyDocument::from_yaml(yaml)?;
        Self::from_document(&document)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path).map_err(|source| TopologyError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        Self::load(&yaml)
    }

    pub fn from_document(document: &TopologyDocument) -> Result<Self> {
        let mut topology = Topology::default();
        for (role, spec) in &document.roles {
            if spec.units.is_empty() {
                return Err(TopologyError::EmptyRole(role.clone()).into());
            }
            let units = spec.units.iter().map(|name| Unit::new(name, role)).collect();
            topology.roles.insert(role.clone(), units);
            if let Some(version) = &spec.version {
                topology.versions.insert(role.clone(), Version::new(version));
            }
        }
        debug!(roles = topology.roles.len(), "topology loaded");
        Ok(topology)
    }

    /// Fails unless every configured role is present with at least one unit.
    pub fn require_roles(
        &self,
        roles: &RoleNames,
    ) -> Result<()> {
        for role in roles.all() {
            self.units(role)?;
        }
        Ok(())
    }

    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    pub fn units(
        &self,
        role: &str,
    ) -> Result<&[Unit]> {
        match self.roles.get(role) {
            None => Err(TopologyError::MissingRole(role.to_string()).into()),
            Some(units) if units.is_empty() => Err(TopologyError::EmptyRole(role.to_string()).into()),
            Some(units) => Ok(units),
        }
    }

    pub fn unit_names(
        &self,
        role: &str,
    ) -> Result<Vec<UnitName>> {
        Ok(self.units(role)?.iter().map(|u| u.name().to_string()).collect())
    }

    pub fn first_unit(
        &self,
        role: &str,
    ) -> Result<&Unit> {
        // units() never returns an empty slice
        self.units(role)?
            .first()
            .ok_or_else(|| TopologyError::EmptyRole(role.to_string()).into())
    }

    pub fn unit(
        &self,
        name: &str,
    ) -> Result<&Unit> {
        self.roles
            .values()
            .flatten()
            .find(|u| u.name() == name)
            .ok_or_else(|| TopologyError::UnknownUnit(name.to_string()).into())
    }

    /// Declared (configured) version of a role, which may differ from what runs.
    pub fn version(
        &self,
        role: &str,
    ) -> Option<&Version> {
        self.versions.get(role)
    }

    /// Records a configuration-intent change. Running software is unaffected
    /// until an explicit upgrade/downgrade action.
    pub(crate) fn declare_version(
        &mut self,
        role: &str,
        version: Version,
    ) {
        self.versions.insert(role.to_string(), version);
    }

    /// Records the status messages observed for one role.
    pub fn record_status(
        &mut self,
        role: &str,
        observed: &BTreeMap<UnitName, StatusMessage>,
    ) {
        if let Some(units) = self.roles.get_mut(role) {
            for unit in units.iter_mut() {
                unit.observe_status(observed.get(unit.name()).cloned());
            }
        }
    }

    /// Records the running processes observed on one unit.
    pub fn record_processes(
        &mut self,
        name: &str,
        processes: BTreeSet<String>,
    ) -> Result<()> {
        let unit = self
            .roles
            .values_mut()
            .flatten()
            .find(|u| u.name() == name)
            .ok_or_else(|| TopologyError::UnknownUnit(name.to_string()))?;
        unit.observe_processes(processes);
        Ok(())
    }
}
