//! Harness Error Hierarchy
//!
//! Every failure aborts the current scenario: there is no automatic retry and
//! no cleanup on the harness side. Errors are grouped by the channel through
//! which the harness observed the problem.
//!
//! Note that an action result without any fields is *not* an error here. See
//! [`crate::ActionOutcome::Unknown`].

use std::time::Duration;

use config::ConfigError;

use crate::StatusDiff;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Harness configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Topology document or role layout problems
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// Expected fleet state not reached within budget
    #[error(transparent)]
    Convergence(#[from] ConvergenceError),

    /// Control-plane action failures
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Cluster operation exited non-zero
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The external collaborator could not be driven at all
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Side-effect checks (artifacts, processes, HA labels) did not hold
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// Unrecoverable failures requiring the scenario to stop
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("Role {0} is not part of the topology")]
    MissingRole(String),

    #[error("Role {0} has no units")]
    EmptyRole(String),

    #[error("Unit {0} is not part of the topology")]
    UnknownUnit(String),

    #[error("Cannot read topology file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid topology document: {0}")]
    InvalidDocument(#[from] serde_yaml::Error),

    #[error("Role {role} needs {required} units, found {found}")]
    NotEnoughUnits {
        role: String,
        required: usize,
        found: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConvergenceError {
    /// The diff is reported verbatim; it is the primary debugging signal.
    #[error("Fleet did not converge after {waited:?}:\n{diff}")]
    TimedOut { waited: Duration, diff: StatusDiff },
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The control plane never reported back within the resolve budget
    #[error("Action {action} on {unit} did not resolve within {timeout:?}")]
    Timeout {
        unit: String,
        action: String,
        timeout: Duration,
    },

    /// The control plane explicitly reported a failure
    #[error("Action {action} on {unit} failed: {message}")]
    Failed {
        unit: String,
        action: String,
        message: String,
    },

    /// Bounded polling of an action result field never reported readiness
    #[error("Action {action} on {unit} never reported {key} after {attempts} attempts over {budget:?}")]
    ReadinessExhausted {
        unit: String,
        action: String,
        key: String,
        budget: Duration,
        attempts: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{step} FAILED on {unit} (exit code {exit_code}):\n{output}")]
    Failed {
        step: String,
        unit: String,
        exit_code: i32,
        output: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("`{command}` exited with {exit_code}: {stderr}")]
    NonZeroExit {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Unparsable controller output: {0}")]
    Parse(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Unknown action handle: {0}")]
    UnknownHandle(String),
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Artifact read through {unit} did not contain {expected:?}:\n{output}")]
    ArtifactMismatch {
        unit: String,
        expected: String,
        output: String,
    },

    #[error("{process} not started on {unit}")]
    ProcessMissing { unit: String, process: String },

    #[error("{process} should not be running on {unit}")]
    ProcessUnexpected { unit: String, process: String },

    #[error("Could not resolve NameNode HA labels: {0}")]
    HaLabelsUnresolved(String),

    #[error("Phase {requested} cannot run before {required}")]
    PhaseOrder { requested: String, required: String },
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Topology(TopologyError::InvalidDocument(e))
    }
}
