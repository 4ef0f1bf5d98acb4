use std::fmt;

use crate::HaReport;
use crate::Result;
use crate::Topology;
use crate::VerificationError;

/// Which NameNode currently holds which HA label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaPair {
    pub active: String,
    pub standby: String,
}

impl HaPair {
    pub fn new(
        active: impl Into<String>,
        standby: impl Into<String>,
    ) -> Self {
        Self {
            active: active.into(),
            standby: standby.into(),
        }
    }

    /// Classifies the NameNode units from their last observed status.
    ///
    /// Exactly one unit must report `HA active`; the other is the standby.
    pub fn resolve(
        topology: &Topology,
        namenode_role: &str,
    ) -> Result<Self> {
        let units = topology.units(namenode_role)?;
        if units.len() != 2 {
            return Err(VerificationError::HaLabelsUnresolved(format!(
                "expected 2 {namenode_role} units, found {}",
                units.len()
            ))
            .into());
        }

        let (active, standby): (Vec<_>, Vec<_>) = units
            .iter()
            .partition(|u| u.status().and_then(HaReport::classify) == Some(HaReport::Active));

        match (active.as_slice(), standby.as_slice()) {
            ([active], [standby]) => Ok(Self::new(active.name(), standby.name())),
            _ => Err(VerificationError::HaLabelsUnresolved(format!(
                "statuses: {:?}",
                units.iter().map(|u| u.status()).collect::<Vec<_>>()
            ))
            .into()),
        }
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.active, &mut self.standby);
    }
}

impl fmt::Display for HaPair {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "active={} standby={}", self.active, self.standby)
    }
}
