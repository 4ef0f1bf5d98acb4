use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::Result;
use crate::Version;

/// Rolling upgrade parameters
///
/// The newest supported version is usually the deployed default, so the
/// upgrade is exercised by moving to a *different* version. The harness never
/// orders versions; it only compares them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpgradeConfig {
    /// Configuration key carrying the version on every versioned role
    #[serde(default = "default_version_key")]
    pub version_key: String,

    /// Version the fleet runs before the upgrade
    #[serde(default = "default_original_version")]
    pub original_version: String,

    /// Version the fleet is moved to
    #[serde(default = "default_target_version")]
    pub target_version: String,

    /// Component name embedded in spec-mismatch messages
    #[serde(default = "default_spec_component")]
    pub spec_component: String,

    /// Workers deliberately left behind to exercise mixed-version tolerance
    #[serde(default = "default_held_back_workers")]
    pub held_back_workers: usize,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            version_key: default_version_key(),
            original_version: default_original_version(),
            target_version: default_target_version(),
            spec_component: default_spec_component(),
            held_back_workers: default_held_back_workers(),
        }
    }
}

impl UpgradeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version_key.trim().is_empty() {
            return Err(invalid("upgrade.version_key cannot be empty"));
        }
        if self.original_version.trim().is_empty() || self.target_version.trim().is_empty() {
            return Err(invalid("upgrade versions cannot be empty"));
        }
        if self.original() == self.target() {
            return Err(invalid(format!(
                "upgrade.target_version must differ from original_version ({})",
                self.original_version
            )));
        }
        if self.spec_component.trim().is_empty() {
            return Err(invalid("upgrade.spec_component cannot be empty"));
        }
        if self.held_back_workers == 0 {
            return Err(invalid(
                "upgrade.held_back_workers must be >= 1 to exercise a partial upgrade",
            ));
        }
        Ok(())
    }

    pub fn original(&self) -> Version {
        Version::new(&self.original_version)
    }

    pub fn target(&self) -> Version {
        Version::new(&self.target_version)
    }
}

fn default_version_key() -> String {
    "hadoop_version".to_string()
}
fn default_original_version() -> String {
    "2.7.2".to_string()
}
fn default_target_version() -> String {
    "2.7.1".to_string()
}
fn default_spec_component() -> String {
    "hadoop".to_string()
}
fn default_held_back_workers() -> usize {
    1
}
