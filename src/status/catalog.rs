use regex::Regex;

use super::Expectation;
use super::FleetExpectation;
use super::MessageForm;
use crate::constants::PLUGIN_READY;
use crate::constants::WORKER_READY;
use crate::Error;
use crate::Result;
use crate::RoleNames;
use crate::Topology;
use crate::Version;

/// HA condition a NameNode reports about itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaReport {
    Active,
    Standby,
    /// Serving alone after its peer went away
    DegradedActive,
    /// Stopped unit; its peer has not been replaced by a standby
    DegradedDown,
}

impl HaReport {
    fn fragment(self) -> &'static str {
        match self {
            HaReport::Active => "HA active",
            HaReport::Standby => "HA standby",
            HaReport::DegradedActive => "HA degraded active (missing: standby)",
            HaReport::DegradedDown => "HA degraded down (missing: standby)",
        }
    }

    /// Classifies a NameNode status message; `None` when it carries no HA state.
    pub fn classify(message: &str) -> Option<HaReport> {
        // degraded fragments contain "active", test them first
        [
            HaReport::DegradedActive,
            HaReport::DegradedDown,
            HaReport::Active,
            HaReport::Standby,
        ]
        .into_iter()
        .find(|report| message.contains(report.fragment()))
    }
}

/// Peer a unit compares its software spec against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecPeer {
    NameNode,
    ResourceManager,
}

impl SpecPeer {
    fn as_str(self) -> &'static str {
        match self {
            SpecPeer::NameNode => "NameNode",
            SpecPeer::ResourceManager => "ResourceManager",
        }
    }
}

/// Status wording for a given fleet size
#[derive(Debug, Clone)]
pub struct StatusCatalog {
    workers: usize,
    spec_component: String,
}

impl StatusCatalog {
    pub fn new(
        workers: usize,
        spec_component: &str,
    ) -> Self {
        Self {
            workers,
            spec_component: spec_component.to_string(),
        }
    }

    pub fn for_topology(
        topology: &Topology,
        roles: &RoleNames,
        spec_component: &str,
    ) -> Result<Self> {
        Ok(Self::new(topology.units(&roles.worker)?.len(), spec_component))
    }

    pub fn namenode(
        &self,
        report: HaReport,
    ) -> String {
        format!(
            "Ready ({} DataNodes, {}, with automatic fail-over)",
            self.workers,
            report.fragment()
        )
    }

    pub fn resourcemanager_ready(&self) -> String {
        format!("Ready ({} NodeManagers)", self.workers)
    }

    pub fn worker_ready(&self) -> String {
        WORKER_READY.to_string()
    }

    pub fn plugin_ready(&self) -> String {
        PLUGIN_READY.to_string()
    }

    /// Message a unit running `local` reports when `peer` runs `remote`.
    pub fn spec_mismatch_message(
        &self,
        peer: SpecPeer,
        local: &Version,
        remote: &Version,
    ) -> String {
        format!(
            "Spec mismatch with {}: {} != {}",
            peer.as_str(),
            self.spec(local),
            self.spec(remote)
        )
    }

    /// Pattern for a spec mismatch against either peer.
    ///
    /// The message embeds the live version pair, so it can only be matched by
    /// pattern and never by a fixed string.
    pub fn spec_mismatch(
        &self,
        local: &Version,
        remote: &Version,
    ) -> Result<MessageForm> {
        let expression = format!(
            "^Spec mismatch with (NameNode|ResourceManager): {} != {}$",
            regex::escape(&self.spec(local)),
            regex::escape(&self.spec(remote)),
        );
        let re = Regex::new(&expression)
            .map_err(|e| Error::Fatal(format!("invalid spec-mismatch pattern: {e}")))?;
        Ok(MessageForm::Pattern(re))
    }

    /// One Active and one Standby, HA with automatic fail-over
    pub fn ha_steady(&self) -> Expectation {
        Expectation::any_of([
            self.namenode(HaReport::Active),
            self.namenode(HaReport::Standby),
        ])
    }

    /// Active stopped, survivor serving alone, standby missing
    pub fn ha_degraded_missing_standby(&self) -> Expectation {
        Expectation::any_of([
            self.namenode(HaReport::DegradedDown),
            self.namenode(HaReport::DegradedActive),
        ])
    }

    /// Every versioned role steady-ready
    pub fn steady_fleet(
        &self,
        roles: &RoleNames,
    ) -> FleetExpectation {
        FleetExpectation::new()
            .role(&roles.namenode, self.ha_steady())
            .role(&roles.resourcemanager, Expectation::exact(self.resourcemanager_ready()))
            .role(&roles.worker, Expectation::exact(self.worker_ready()))
            .role(&roles.plugin, Expectation::exact(self.plugin_ready()))
    }

    fn spec(
        &self,
        version: &Version,
    ) -> String {
        format!("{{'{}': '{}'}}", self.spec_component, version)
    }
}
