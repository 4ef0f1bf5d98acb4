use std::collections::BTreeSet;

use fleet_harness::ConvergenceError;
use fleet_harness::Error;
use fleet_harness::ScenarioPhase;
use fleet_harness::SimulationOptions;
use fleet_harness::Version;

use crate::common::simulated_scenario;
use crate::common::ORIGINAL_VERSION;
use crate::common::TARGET_VERSION;

fn inert(units: &[&str]) -> SimulationOptions {
    SimulationOptions {
        inert_units: units.iter().map(|u| u.to_string()).collect::<BTreeSet<_>>(),
        ..Default::default()
    }
}

/// A worker that ignores its upgrade never reaches the steady fleet; the
/// scenario stops in the upgrade phase and leaves the fleet as it is.
#[tokio::test(start_paused = true)]
async fn test_stuck_worker_aborts_upgrade() {
    let mut ctx = simulated_scenario(inert(&["slave/2"]));

    let err = ctx.runner.run().await.unwrap_err();

    match err {
        Error::Convergence(ConvergenceError::TimedOut { diff, .. }) => {
            let roles: Vec<_> = diff.unsatisfied().map(|r| r.role.clone()).collect();
            assert_eq!(roles, vec!["slave".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(ctx.runner.checkpoints().last(), Some(ScenarioPhase::Failover));
    assert_eq!(
        ctx.cluster.installed_version("namenode/0"),
        Some(Version::new(TARGET_VERSION))
    );
    assert_eq!(
        ctx.cluster.installed_version("slave/2"),
        Some(Version::new(ORIGINAL_VERSION))
    );
    assert!(!ctx.cluster.upgrade_finalized());
}

/// A NameNode that ignores `stop-namenode` never degrades the HA pair.
#[tokio::test(start_paused = true)]
async fn test_unresponsive_namenode_aborts_failover() {
    let mut ctx = simulated_scenario(inert(&["namenode/0"]));

    let err = ctx.runner.run().await.unwrap_err();

    assert!(matches!(err, Error::Convergence(ConvergenceError::TimedOut { .. })));
    assert_eq!(ctx.runner.checkpoints().last(), Some(ScenarioPhase::Workload));
    assert!(ctx
        .cluster
        .action_log()
        .iter()
        .all(|(_, action)| action != "upgrade"));
}
