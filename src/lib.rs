//! Verification harness for an HA Hadoop fleet managed by a model-driven
//! orchestrator.
//!
//! The harness drives an already-deployed fleet through a scripted lifecycle
//! (component checks, HDFS workload, NameNode failover, rolling upgrade with a
//! deliberate partial stop, plugin downgrade toggle) and decides whether the
//! fleet converged to the expected state after each step. Everything it knows
//! about the fleet comes through a [`ClusterController`].

mod action;
mod cluster;
mod components;
mod config;
pub mod constants;
mod convergence;
mod errors;
mod failover;
mod scenario;
mod simulator;
mod status;
mod topology;
mod upgrade;
pub mod utils;
mod workload;

pub use action::*;
pub use cluster::*;
pub use components::*;
pub use config::*;
pub use convergence::*;
pub use errors::*;
pub use failover::*;
pub use scenario::*;
pub use simulator::*;
pub use status::*;
pub use topology::*;
pub use upgrade::*;
pub use utils::*;
pub use workload::*;
