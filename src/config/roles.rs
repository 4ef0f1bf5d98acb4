use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::constants::*;
use crate::Result;

/// Role (application) names as they appear in the deployed topology
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RoleNames {
    #[serde(default = "default_namenode")]
    pub namenode: String,

    #[serde(default = "default_resourcemanager")]
    pub resourcemanager: String,

    /// Combined DataNode + NodeManager pool
    #[serde(default = "default_worker")]
    pub worker: String,

    #[serde(default = "default_plugin")]
    pub plugin: String,

    #[serde(default = "default_client")]
    pub client: String,
}

impl Default for RoleNames {
    fn default() -> Self {
        Self {
            namenode: default_namenode(),
            resourcemanager: default_resourcemanager(),
            worker: default_worker(),
            plugin: default_plugin(),
            client: default_client(),
        }
    }
}

impl RoleNames {
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in self.all() {
            if name.trim().is_empty() {
                return Err(invalid("role names cannot be empty"));
            }
            if !seen.insert(name) {
                return Err(invalid(format!("role name {name} is used twice")));
            }
        }
        Ok(())
    }

    /// Roles whose version is driven by the rolling upgrade, in reconfiguration order
    pub fn versioned(&self) -> [&str; 4] {
        [
            self.namenode.as_str(),
            self.resourcemanager.as_str(),
            self.worker.as_str(),
            self.plugin.as_str(),
        ]
    }

    pub fn all(&self) -> [&str; 5] {
        [
            self.namenode.as_str(),
            self.resourcemanager.as_str(),
            self.worker.as_str(),
            self.plugin.as_str(),
            self.client.as_str(),
        ]
    }
}

fn default_namenode() -> String {
    DEFAULT_NAMENODE_ROLE.to_string()
}
fn default_resourcemanager() -> String {
    DEFAULT_RESOURCEMANAGER_ROLE.to_string()
}
fn default_worker() -> String {
    DEFAULT_WORKER_ROLE.to_string()
}
fn default_plugin() -> String {
    DEFAULT_PLUGIN_ROLE.to_string()
}
fn default_client() -> String {
    DEFAULT_CLIENT_ROLE.to_string()
}
