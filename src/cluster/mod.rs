//! The external collaborator.
//!
//! Everything the harness knows about the fleet comes through
//! [`ClusterController`]; everything it does to the fleet goes through
//! [`ClusterController::configure`] (declared intent) or
//! [`ClusterController::invoke_action`]. Nothing else mutates the cluster.

mod cli;
pub use cli::*;


use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Result;
use crate::StatusMessage;
use crate::UnitName;

/// Combined output and exit code of one command run on a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub output: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn new(
        output: impl Into<String>,
        exit_code: i32,
    ) -> Self {
        Self {
            output: output.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

pub type ActionParams = BTreeMap<String, String>;

/// Correlates a dispatched action with its unit and name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionHandle {
    pub id: String,
    pub unit: UnitName,
    pub name: String,
}

impl fmt::Display for ActionHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} on {} ({})", self.name, self.unit, self.id)
    }
}

/// What the control plane reported for an action.
///
/// `fields` only holds what the action chose to set. An empty map tells the
/// caller nothing: the action may have succeeded silently, failed, or not
/// finished before the fetch gave up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionResult {
    /// The control plane reported a terminal state before the fetch timeout
    pub completed: bool,
    /// Explicit failure message, when the action reported one
    pub failure: Option<String>,
    pub fields: BTreeMap<String, String>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterController: Send + Sync + 'static {
    /// Runs `command` on `unit` and returns combined output and exit code.
    async fn exec(
        &self,
        unit: &str,
        command: &str,
    ) -> Result<CommandOutput>;

    /// Fire-and-forget dispatch of a named action.
    async fn invoke_action(
        &self,
        unit: &str,
        name: &str,
        params: &ActionParams,
    ) -> Result<ActionHandle>;

    /// Blocks until the action reports a terminal state or `timeout` elapses.
    async fn fetch_result(
        &self,
        handle: &ActionHandle,
        timeout: Duration,
    ) -> Result<ActionResult>;

    /// Current status message of every unit of `role`.
    async fn current_status(
        &self,
        role: &str,
    ) -> Result<BTreeMap<UnitName, StatusMessage>>;

    /// Changes one configuration value of `role`. Takes effect on running
    /// software only after an explicit upgrade/downgrade action.
    async fn configure(
        &self,
        role: &str,
        key: &str,
        value: &str,
    ) -> Result<()>;
}
