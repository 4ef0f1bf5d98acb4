use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::Result;

/// Controller CLI used by [`crate::CliController`]
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ControllerConfig {
    /// Executable name or path of the controller CLI
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Model to target; the CLI's current model when unset
    #[serde(default)]
    pub model: Option<String>,

    /// Upper bound for any single CLI invocation (seconds)
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            model: None,
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.binary.trim().is_empty() {
            return Err(invalid("controller.binary cannot be empty"));
        }
        if self.command_timeout_secs == 0 {
            return Err(invalid("controller.command_timeout_secs must be > 0"));
        }
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(invalid("controller.model cannot be blank when set"));
            }
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

fn default_binary() -> String {
    "juju".to_string()
}
fn default_command_timeout_secs() -> u64 {
    120
}
