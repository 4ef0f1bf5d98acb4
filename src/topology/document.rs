use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Structured description of an already-deployed fleet.
///
/// ```yaml
/// roles:
///   namenode:
///     units: [namenode/0, namenode/1]
///     version: "2.7.2"
///   client:
///     units: [client/0]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyDocument {
    pub roles: BTreeMap<String, RoleDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleDocument {
    /// Unit identifiers in their deployment order
    pub units: Vec<String>,

    /// Declared version for versioned roles
    #[serde(default)]
    pub version: Option<String>,
}

impl TopologyDocument {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Builds a document with `count` units named `<role>/<n>`.
    pub fn with_role(
        mut self,
        role: &str,
        count: usize,
        version: Option<&str>,
    ) -> Self {
        self.roles.insert(
            role.to_string(),
            RoleDocument {
                units: (0..count).map(|n| format!("{role}/{n}")).collect(),
                version: version.map(str::to_string),
            },
        );
        self
    }
}
