use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing_test::traced_test;

use super::*;
use crate::ActionHandle;
use crate::ActionParams;
use crate::ActionResult;
use crate::CommandOutput;
use crate::ControllerError;
use crate::SimulatedCluster;
use crate::SimulationOptions;
use crate::TopologyDocument;
use crate::StatusMessage;
use crate::TopologyError;
use crate::UnitName;

fn document() -> TopologyDocument {
    TopologyDocument::default()
        .with_role("namenode", 2, Some("2.7.2"))
        .with_role("resourcemanager", 1, Some("2.7.2"))
        .with_role("slave", 3, Some("2.7.2"))
        .with_role("plugin", 1, Some("2.7.2"))
        .with_role("client", 1, None)
}

fn runner(options: SimulationOptions) -> (Arc<SimulatedCluster>, ScenarioRunner<SimulatedCluster>) {
    let topology = Topology::from_document(&document()).unwrap();
    let config = HarnessConfig::default();
    let cluster = Arc::new(SimulatedCluster::new(&topology, &config, options).unwrap());
    let runner = ScenarioRunner::new(cluster.clone(), config, topology).unwrap();
    (cluster, runner)
}

#[test]
fn test_phase_names_round_trip() {
    for phase in ScenarioPhase::ALL {
        assert_eq!(phase.to_string().parse::<ScenarioPhase>().unwrap(), phase);
    }
    assert_eq!(
        "hdfs-directories".parse::<ScenarioPhase>().unwrap(),
        ScenarioPhase::HdfsDirectories
    );
    assert!("rollback".parse::<ScenarioPhase>().is_err());
}

#[test]
fn test_missing_role_is_rejected_up_front() {
    let mut document = document();
    document.roles.remove("client");
    let topology = Topology::from_document(&document).unwrap();
    let cluster = Arc::new(SimulatedCluster::new(&topology, &HarnessConfig::default(), SimulationOptions::default()).unwrap());

    let err = ScenarioRunner::new(cluster, HarnessConfig::default(), topology).err().unwrap();

    assert!(matches!(err, Error::Topology(TopologyError::MissingRole(ref r)) if r == "client"));
}

#[tokio::test(start_paused = true)]
async fn test_setup_discovers_labels() {
    let (_, mut runner) = runner(SimulationOptions {
        initial_active: 1,
        ..Default::default()
    });

    runner.setup().await.unwrap();

    assert_eq!(runner.pair(), Some(&HaPair::new("namenode/1", "namenode/0")));
    assert_eq!(runner.checkpoints().phases(), vec![ScenarioPhase::Setup]);
}

#[tokio::test(start_paused = true)]
async fn test_components_need_setup() {
    let (_, mut runner) = runner(SimulationOptions::default());

    let err = runner.verify_components().await.unwrap_err();

    assert!(matches!(err, Error::Verification(VerificationError::PhaseOrder { .. })));
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn test_resume_at_failover_needs_artifact() {
    let (cluster, mut runner) = runner(SimulationOptions::default());

    let err = runner.run_from(ScenarioPhase::Failover).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Verification(VerificationError::PhaseOrder { ref required, .. }) if required == "artifact"
    ));
    assert!(cluster.action_log().is_empty());
    assert!(logs_contain("scenario aborted"));
}

#[tokio::test(start_paused = true)]
async fn test_run_from_workload_skips_earlier_phases() {
    let (cluster, mut runner) = runner(SimulationOptions::default());
    runner.setup().await.unwrap();
    runner.prepare_hdfs_directories().await.unwrap();
    runner.write_artifact().await.unwrap();

    runner.run_from(ScenarioPhase::Workload).await.unwrap();

    assert_eq!(
        runner.checkpoints().phases(),
        vec![
            ScenarioPhase::Setup,
            ScenarioPhase::Setup,
            ScenarioPhase::Workload,
            ScenarioPhase::Failover,
            ScenarioPhase::Upgrade,
            ScenarioPhase::Complete,
        ]
    );
    assert!(!cluster.hdfs_exists("/user/ubuntu/teragenout"));
}

#[tokio::test(start_paused = true)]
async fn test_status_report_on_steady_fleet() {
    let (_, mut runner) = runner(SimulationOptions::default());

    let diff = runner.status_report().await.unwrap();

    assert!(diff.is_satisfied());
    assert_eq!(diff.roles.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_ensure_artifact_lets_failover_run_alone() {
    let (cluster, mut runner) = runner(SimulationOptions::default());
    runner.setup().await.unwrap();
    assert!(!runner.artifact_readable().await.unwrap());

    runner.ensure_artifact().await.unwrap();
    runner.run_failover().await.unwrap();

    assert!(cluster.hdfs_exists("/user/ubuntu/testfile"));
    assert_eq!(runner.pair(), Some(&HaPair::new("namenode/1", "namenode/0")));
}

#[tokio::test(start_paused = true)]
async fn test_ensure_artifact_keeps_existing_file() {
    let (_, mut runner) = runner(SimulationOptions::default());
    runner.setup().await.unwrap();
    runner.prepare_hdfs_directories().await.unwrap();
    runner.write_artifact().await.unwrap();

    // a second put of the same file would fail
    runner.ensure_artifact().await.unwrap();
}

/// Simulated fleet whose command channel is unreachable.
struct UnreachableExec(SimulatedCluster);

#[async_trait]
impl ClusterController for UnreachableExec {
    async fn exec(
        &self,
        _unit: &str,
        command: &str,
    ) -> Result<CommandOutput> {
        Err(ControllerError::Timeout {
            command: command.to_string(),
            timeout: Duration::from_secs(60),
        }
        .into())
    }

    async fn invoke_action(
        &self,
        unit: &str,
        name: &str,
        params: &ActionParams,
    ) -> Result<ActionHandle> {
        self.0.invoke_action(unit, name, params).await
    }

    async fn fetch_result(
        &self,
        handle: &ActionHandle,
        timeout: Duration,
    ) -> Result<ActionResult> {
        self.0.fetch_result(handle, timeout).await
    }

    async fn current_status(
        &self,
        role: &str,
    ) -> Result<BTreeMap<UnitName, StatusMessage>> {
        self.0.current_status(role).await
    }

    async fn configure(
        &self,
        role: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.0.configure(role, key, value).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_resume_reports_unreachable_fleet_as_is() {
    let topology = Topology::from_document(&document()).unwrap();
    let config = HarnessConfig::default();
    let cluster = SimulatedCluster::new(&topology, &config, SimulationOptions::default()).unwrap();
    let mut runner = ScenarioRunner::new(Arc::new(UnreachableExec(cluster)), config, topology).unwrap();

    let err = runner.run_from(ScenarioPhase::Failover).await.unwrap_err();

    assert!(matches!(err, Error::Controller(ControllerError::Timeout { .. })));
}
