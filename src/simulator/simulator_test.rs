use super::*;
use crate::constants::*;
use crate::ActionOutcome;
use crate::Resolution;
use crate::TopologyDocument;

fn topology() -> Topology {
    let document = TopologyDocument::default()
        .with_role("namenode", 2, Some("2.7.2"))
        .with_role("resourcemanager", 1, Some("2.7.2"))
        .with_role("slave", 3, Some("2.7.2"))
        .with_role("plugin", 1, Some("2.7.2"))
        .with_role("client", 1, None);
    Topology::from_document(&document).unwrap()
}

fn cluster(options: SimulationOptions) -> SimulatedCluster {
    SimulatedCluster::new(&topology(), &HarnessConfig::default(), options).unwrap()
}

fn immediate() -> SimulationOptions {
    SimulationOptions {
        status_lag: 0,
        ..Default::default()
    }
}

async fn act(
    cluster: &SimulatedCluster,
    unit: &str,
    name: &str,
) -> Resolution {
    let handle = cluster
        .invoke_action(unit, name, &ActionParams::new())
        .await
        .unwrap();
    let result = cluster.fetch_result(&handle, Duration::from_secs(1)).await.unwrap();
    Resolution::new(handle, result)
}

async fn client_exec(
    cluster: &SimulatedCluster,
    command: &str,
) -> CommandOutput {
    cluster.exec("client/0", command).await.unwrap()
}

#[test]
fn test_split_identity() {
    assert_eq!(
        split_identity("su hdfs -c 'hdfs dfs -ls /'"),
        ("hdfs", "hdfs dfs -ls /")
    );
    assert_eq!(split_identity("pgrep -a java"), ("root", "pgrep -a java"));
}

#[tokio::test]
async fn test_initial_status_is_steady() {
    let cluster = cluster(immediate());

    let namenodes = cluster.current_status("namenode").await.unwrap();
    assert_eq!(
        namenodes["namenode/0"],
        "Ready (3 DataNodes, HA active, with automatic fail-over)"
    );
    assert_eq!(
        namenodes["namenode/1"],
        "Ready (3 DataNodes, HA standby, with automatic fail-over)"
    );
    assert_eq!(
        cluster.current_status("resourcemanager").await.unwrap()["resourcemanager/0"],
        "Ready (3 NodeManagers)"
    );
    let workers = cluster.current_status("slave").await.unwrap();
    assert_eq!(workers.len(), 3);
    assert!(workers.values().all(|m| m == "Ready (DataNode & NodeManager)"));
}

#[tokio::test]
async fn test_status_publication_lags() {
    let cluster = cluster(SimulationOptions {
        status_lag: 2,
        ..Default::default()
    });

    act(&cluster, "namenode/0", ACTION_STOP_NAMENODE).await;

    for _ in 0..2 {
        let stale = cluster.current_status("namenode").await.unwrap();
        assert!(stale["namenode/0"].contains("HA active"));
    }
    let fresh = cluster.current_status("namenode").await.unwrap();
    assert!(fresh["namenode/0"].contains("HA degraded down (missing: standby)"));
    assert!(fresh["namenode/1"].contains("HA degraded active (missing: standby)"));
}

#[tokio::test]
async fn test_restarted_namenode_rejoins_as_standby() {
    let cluster = cluster(immediate());

    act(&cluster, "namenode/0", ACTION_STOP_NAMENODE).await;
    act(&cluster, "namenode/0", ACTION_START_NAMENODE).await;

    let namenodes = cluster.current_status("namenode").await.unwrap();
    assert!(namenodes["namenode/0"].contains("HA standby"));
    assert!(namenodes["namenode/1"].contains("HA active"));
}

#[tokio::test]
async fn test_held_back_worker_reports_spec_mismatch() {
    let cluster = cluster(immediate());
    for role in ["namenode", "resourcemanager", "slave", "plugin"] {
        cluster.configure(role, "hadoop_version", "2.7.1").await.unwrap();
    }

    act(&cluster, "namenode/0", ACTION_PREPARE_UPGRADE).await;
    for _ in 0..3 {
        act(&cluster, "namenode/0", ACTION_QUERY).await;
    }
    for unit in ["namenode/1", "namenode/0", "resourcemanager/0", "plugin/0", "slave/0", "slave/1"] {
        let resolution = act(&cluster, unit, ACTION_UPGRADE).await;
        assert_eq!(resolution.outcome(), ActionOutcome::Unknown, "{unit}");
    }

    let workers = cluster.current_status("slave").await.unwrap();
    assert_eq!(workers["slave/0"], "Ready (DataNode & NodeManager)");
    assert_eq!(
        workers["slave/2"],
        "Spec mismatch with NameNode: {'hadoop': '2.7.2'} != {'hadoop': '2.7.1'}"
    );
    assert_eq!(cluster.installed_version("slave/2"), Some(Version::new("2.7.2")));
}

#[tokio::test]
async fn test_query_reports_ready_after_preparation() {
    let cluster = cluster(immediate());

    assert!(!act(&cluster, "namenode/0", ACTION_QUERY).await.flag(READY_FIELD));

    act(&cluster, "namenode/0", ACTION_PREPARE_UPGRADE).await;
    assert!(!act(&cluster, "namenode/0", ACTION_QUERY).await.flag(READY_FIELD));
    assert!(!act(&cluster, "namenode/0", ACTION_QUERY).await.flag(READY_FIELD));
    assert!(act(&cluster, "namenode/0", ACTION_QUERY).await.flag(READY_FIELD));
    assert!(cluster.upgrade_image_ready());
}

#[tokio::test]
async fn test_namenode_upgrade_without_image_fails_explicitly() {
    let cluster = cluster(immediate());
    cluster.configure("namenode", "hadoop_version", "2.7.1").await.unwrap();

    let resolution = act(&cluster, "namenode/1", ACTION_UPGRADE).await;

    assert!(matches!(resolution.outcome(), ActionOutcome::Failed(m) if m.contains("prepare-upgrade")));
    assert_eq!(cluster.installed_version("namenode/1"), Some(Version::new("2.7.2")));
}

#[tokio::test]
async fn test_prepare_upgrade_requires_active_namenode() {
    let cluster = cluster(immediate());

    let resolution = act(&cluster, "namenode/1", ACTION_PREPARE_UPGRADE).await;

    assert!(matches!(resolution.outcome(), ActionOutcome::Failed(_)));
}

#[tokio::test]
async fn test_inert_unit_ignores_upgrade() {
    let cluster = cluster(SimulationOptions {
        status_lag: 0,
        inert_units: BTreeSet::from(["slave/2".to_string()]),
        ..Default::default()
    });
    cluster.configure("slave", "hadoop_version", "2.7.1").await.unwrap();

    let resolution = act(&cluster, "slave/2", ACTION_UPGRADE).await;

    assert_eq!(resolution.outcome(), ActionOutcome::Unknown);
    assert_eq!(cluster.installed_version("slave/2"), Some(Version::new("2.7.2")));
}

#[tokio::test]
async fn test_unknown_unit_is_a_controller_error() {
    let cluster = cluster(immediate());

    let err = cluster.exec("ghost/0", "pgrep -a java").await.unwrap_err();

    assert!(matches!(err, crate::Error::Controller(ControllerError::UnknownUnit(_))));
}

#[tokio::test]
async fn test_hdfs_round_trip() {
    let cluster = cluster(immediate());

    // ubuntu cannot write before its home exists
    assert_eq!(client_exec(&cluster, "su ubuntu -c 'echo test-file-contents > /tmp/testfile'").await.exit_code, 0);
    assert_eq!(client_exec(&cluster, "su ubuntu -c 'hdfs dfs -put /tmp/testfile'").await.exit_code, 1);

    assert!(client_exec(&cluster, "su hdfs -c 'hdfs dfs -mkdir -p /user/ubuntu'").await.success());
    assert!(client_exec(&cluster, "su ubuntu -c 'hdfs dfs -chown ubuntu:ubuntu /user/ubuntu'").await.exit_code == 1);
    assert!(client_exec(&cluster, "su hdfs -c 'hdfs dfs -chown ubuntu:ubuntu /user/ubuntu'").await.success());
    assert!(client_exec(&cluster, "su hdfs -c 'hdfs dfs -chmod -R 755 /user/ubuntu'").await.success());
    assert!(client_exec(&cluster, "su ubuntu -c 'hdfs dfs -put /tmp/testfile'").await.success());

    let read = client_exec(&cluster, "su ubuntu -c 'hdfs dfs -cat testfile'").await;
    assert!(read.success());
    assert_eq!(read.output, "test-file-contents\n");
    assert!(cluster.hdfs_exists("/user/ubuntu/testfile"));
}

#[tokio::test]
async fn test_terasort_needs_teragen_output() {
    let cluster = cluster(immediate());
    for command in [
        "su hdfs -c 'hdfs dfs -mkdir -p /user/ubuntu'",
        "su hdfs -c 'hdfs dfs -chown ubuntu:ubuntu /user/ubuntu'",
    ] {
        assert!(cluster.exec("client/0", command).await.unwrap().success());
    }

    let sort = "su ubuntu -c 'hadoop jar examples.jar terasort /user/ubuntu/teragenout /user/ubuntu/terasortout'";
    assert_eq!(cluster.exec("client/0", sort).await.unwrap().exit_code, 255);

    let generate = "su ubuntu -c 'hadoop jar examples.jar teragen 10000 /user/ubuntu/teragenout'";
    assert!(cluster.exec("client/0", generate).await.unwrap().success());
    assert!(cluster.exec("client/0", sort).await.unwrap().success());
    assert!(cluster.hdfs_exists("/user/ubuntu/terasortout/_SUCCESS"));
}

#[tokio::test]
async fn test_hdfs_unavailable_without_namenode() {
    let cluster = cluster(immediate());
    act(&cluster, "namenode/0", ACTION_STOP_NAMENODE).await;
    act(&cluster, "namenode/1", ACTION_STOP_NAMENODE).await;

    let out = cluster
        .exec("client/0", "su hdfs -c 'hdfs dfs -ls /'")
        .await
        .unwrap();

    assert_eq!(out.exit_code, 1);
    assert!(out.output.contains("Connection refused"));
}

#[tokio::test]
async fn test_stopped_namenode_lists_no_java_processes() {
    let cluster = cluster(immediate());
    act(&cluster, "namenode/0", ACTION_STOP_NAMENODE).await;

    let out = cluster.exec("namenode/0", LIST_JAVA_PROCESSES).await.unwrap();

    assert_eq!(out, CommandOutput::new("", 1));
}
