use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::Result;

/// Budgets for [`crate::ActionCoordinator`]
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct ActionConfig {
    /// How long to wait for one action to report completion (seconds)
    #[serde(default = "default_resolve_timeout_secs")]
    pub resolve_timeout_secs: u64,

    /// Overall budget for polling a readiness field, e.g. `query` after
    /// `prepare-upgrade` (seconds)
    #[serde(default = "default_readiness_budget_secs")]
    pub readiness_budget_secs: u64,

    /// Pause between two readiness queries (milliseconds)
    #[serde(default = "default_readiness_poll_interval_ms")]
    pub readiness_poll_interval_ms: u64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            resolve_timeout_secs: default_resolve_timeout_secs(),
            readiness_budget_secs: default_readiness_budget_secs(),
            readiness_poll_interval_ms: default_readiness_poll_interval_ms(),
        }
    }
}

impl ActionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.resolve_timeout_secs == 0 {
            return Err(invalid("actions.resolve_timeout_secs must be > 0"));
        }
        if self.readiness_budget_secs == 0 {
            return Err(invalid("actions.readiness_budget_secs must be > 0"));
        }
        if self.readiness_poll_interval_ms == 0 {
            return Err(invalid("actions.readiness_poll_interval_ms must be > 0"));
        }
        if self.readiness_poll_interval() >= self.readiness_budget() {
            return Err(invalid(
                "actions.readiness_poll_interval_ms must be shorter than readiness_budget_secs",
            ));
        }
        Ok(())
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn readiness_budget(&self) -> Duration {
        Duration::from_secs(self.readiness_budget_secs)
    }

    pub fn readiness_poll_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_interval_ms)
    }
}

fn default_resolve_timeout_secs() -> u64 {
    600
}
fn default_readiness_budget_secs() -> u64 {
    300
}
fn default_readiness_poll_interval_ms() -> u64 {
    5_000
}
