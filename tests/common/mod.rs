use std::sync::Arc;

use fleet_harness::HarnessConfig;
use fleet_harness::ScenarioRunner;
use fleet_harness::SimulatedCluster;
use fleet_harness::SimulationOptions;
use fleet_harness::Topology;

pub const ORIGINAL_VERSION: &str = "2.7.2";
pub const TARGET_VERSION: &str = "2.7.1";

/// Two NameNodes, one ResourceManager, three workers, one plugin, one client
pub const TOPOLOGY: &str = r#"
roles:
  namenode:
    units: [namenode/0, namenode/1]
    version: "2.7.2"
  resourcemanager:
    units: [resourcemanager/0]
    version: "2.7.2"
  slave:
    units: [slave/0, slave/1, slave/2]
    version: "2.7.2"
  plugin:
    units: [plugin/0]
    version: "2.7.2"
  client:
    units: [client/0]
"#;

pub const VERSIONED_UNITS: [&str; 7] = [
    "namenode/0",
    "namenode/1",
    "resourcemanager/0",
    "slave/0",
    "slave/1",
    "slave/2",
    "plugin/0",
];

pub struct TestContext {
    pub cluster: Arc<SimulatedCluster>,
    pub runner: ScenarioRunner<SimulatedCluster>,
}

pub fn harness_config() -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.convergence.timeout_secs = 600;
    config.convergence.poll_interval_ms = 2_000;
    config
}

pub fn simulated_scenario(options: SimulationOptions) -> TestContext {
    let topology = Topology::load(TOPOLOGY).expect("topology");
    let config = harness_config().validate().expect("valid config");
    let cluster = Arc::new(SimulatedCluster::new(&topology, &config, options).expect("simulator"));
    let runner = ScenarioRunner::new(cluster.clone(), config, topology).expect("runner");
    TestContext { cluster, runner }
}
