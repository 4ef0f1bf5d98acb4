use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::StatusMessage;
use super::UnitName;

/// A configured software version.
///
/// Versions are compared structurally only. `Version` deliberately does not
/// implement `PartialOrd`: the harness knows whether a unit runs the target
/// version, never whether one version is newer than another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Unit {
    name: UnitName,
    role: String,
    status: Option<StatusMessage>,
    processes: BTreeSet<String>,
}

impl Unit {
    pub(crate) fn new(
        name: &str,
        role: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            role: role.to_string(),
            status: None,
            processes: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// Last observed status message; `None` before the first poll or when the
    /// unit was missing from the last report
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn processes(&self) -> &BTreeSet<String> {
        &self.processes
    }

    pub(crate) fn observe_status(
        &mut self,
        status: Option<StatusMessage>,
    ) {
        self.status = status;
    }

    pub(crate) fn observe_processes(
        &mut self,
        processes: BTreeSet<String>,
    ) {
        self.processes = processes;
    }
}
