use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::Result;

/// Status polling parameters for [`crate::ConvergenceWaiter`]
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct ConvergenceConfig {
    /// Delay between two status reads (unit: milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Overall deadline for one awaited state (unit: seconds).
    /// Cluster convergence routinely takes several minutes.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ConvergenceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(invalid("convergence.poll_interval_ms must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(invalid("convergence.timeout_secs must be > 0"));
        }
        if self.poll_interval() >= self.timeout() {
            return Err(invalid(format!(
                "convergence.poll_interval_ms ({}) must be shorter than timeout_secs ({})",
                self.poll_interval_ms, self.timeout_secs
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_poll_interval_ms() -> u64 {
    5_000
}
fn default_timeout_secs() -> u64 {
    1_800
}
