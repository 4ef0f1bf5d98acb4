use fleet_harness::constants::ACTION_STOP_NAMENODE;
use fleet_harness::HaPair;
use fleet_harness::ScenarioPhase;
use fleet_harness::SimulationOptions;
use fleet_harness::Version;

use crate::common::simulated_scenario;
use crate::common::TARGET_VERSION;
use crate::common::VERSIONED_UNITS;

/// Whole lifecycle on a steady fleet: every phase passes, HA labels end up
/// swapped and every versioned unit runs the target version.
#[tokio::test(start_paused = true)]
async fn test_full_scenario_on_simulated_fleet() {
    let mut ctx = simulated_scenario(SimulationOptions::default());

    ctx.runner.run().await.unwrap();

    assert_eq!(ctx.runner.checkpoints().phases(), ScenarioPhase::ALL.to_vec());
    assert_eq!(ctx.runner.pair(), Some(&HaPair::new("namenode/1", "namenode/0")));
    for unit in VERSIONED_UNITS {
        assert_eq!(
            ctx.cluster.installed_version(unit),
            Some(Version::new(TARGET_VERSION)),
            "{unit}"
        );
    }
    assert!(ctx.cluster.upgrade_finalized());
    assert!(ctx.cluster.hdfs_exists("/user/ubuntu/testfile"));
    assert!(!ctx.cluster.hdfs_exists("/user/ubuntu/teragenout"));
}

#[tokio::test(start_paused = true)]
async fn test_failover_starting_from_second_namenode() {
    let mut ctx = simulated_scenario(SimulationOptions {
        initial_active: 1,
        ..Default::default()
    });

    ctx.runner.run().await.unwrap();

    assert_eq!(ctx.runner.pair(), Some(&HaPair::new("namenode/0", "namenode/1")));
    let stops: Vec<_> = ctx
        .cluster
        .action_log()
        .into_iter()
        .filter(|(_, action)| action == ACTION_STOP_NAMENODE)
        .map(|(unit, _)| unit)
        .collect();
    assert_eq!(stops, vec!["namenode/1"]);
}

#[tokio::test(start_paused = true)]
async fn test_status_report_before_anything_ran() {
    let mut ctx = simulated_scenario(SimulationOptions::default());

    let diff = ctx.runner.status_report().await.unwrap();

    assert!(diff.is_satisfied(), "{diff}");
    assert!(ctx.cluster.action_log().is_empty());
}
