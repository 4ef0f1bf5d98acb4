use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use fleet_harness::CliController;
use fleet_harness::ClusterController;
use fleet_harness::HarnessConfig;
use fleet_harness::Result;
use fleet_harness::ScenarioPhase;
use fleet_harness::ScenarioRunner;
use fleet_harness::SimulatedCluster;
use fleet_harness::SimulationOptions;
use fleet_harness::Topology;
use tracing::error;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;


#[derive(Parser, Debug)]
#[command(name = "fleet-harness", version, about = "Verifies an HA Hadoop fleet end to end")]
struct Cli {
    /// Extra configuration file merged over defaults and `CONFIG_PATH`
    #[arg(long)]
    config: Option<String>,

    /// YAML document describing the deployed roles and units
    #[arg(long)]
    topology: PathBuf,

    /// Drive an in-process fleet model instead of the controller CLI
    #[arg(long)]
    simulate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the whole scenario, optionally resuming at a later phase
    Run {
        #[arg(long, default_value = "setup")]
        from: ScenarioPhase,
    },
    /// Print one observation of every versioned role against the steady fleet
    Status,
    /// Check which Hadoop daemons run where
    Components,
    /// Stop and restart the Active NameNode
    Failover,
    /// Rolling upgrade to the configured target version
    Upgrade,
    /// HDFS directories, test artifact and MapReduce jobs
    Workload,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    init_observability();

    let cli = Cli::parse();
    match execute(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<bool> {
    let mut config = HarnessConfig::new()?;
    if let Some(path) = &cli.config {
        config = config.with_override_config(path)?;
    }
    let config = config.validate()?;
    let topology = Topology::from_file(&cli.topology)?;
    info!(?config, simulate = cli.simulate, "harness configured");

    if cli.simulate {
        let cluster = SimulatedCluster::new(&topology, &config, SimulationOptions::default())?;
        drive(Arc::new(cluster), config, topology, cli.command).await
    } else {
        let cluster = CliController::new(config.controller.clone());
        drive(Arc::new(cluster), config, topology, cli.command).await
    }
}

/// Returns whether the fleet satisfied the command's checks.
async fn drive<C: ClusterController>(
    controller: Arc<C>,
    config: HarnessConfig,
    topology: Topology,
    command: Command,
) -> Result<bool> {
    let mut runner = ScenarioRunner::new(controller, config, topology)?;
    match command {
        Command::Run { from } => runner.run_from(from).await?,
        Command::Status => {
            let diff = runner.status_report().await?;
            println!("{diff}");
            return Ok(diff.is_satisfied());
        }
        Command::Components => {
            runner.setup().await?;
            runner.verify_components().await?;
        }
        Command::Failover => {
            runner.setup().await?;
            runner.ensure_artifact().await?;
            runner.run_failover().await?;
        }
        Command::Upgrade => {
            runner.setup().await?;
            runner.ensure_artifact().await?;
            runner.run_upgrade().await?;
        }
        Command::Workload => {
            runner.setup().await?;
            runner.prepare_hdfs_directories().await?;
            runner.ensure_artifact().await?;
            runner.run_workload().await?;
        }
    }
    if let Some(pair) = runner.pair() {
        info!(%pair, "done");
    }
    Ok(true)
}

fn init_observability() {
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));
    tracing_subscriber::registry().with(base_subscriber).init();
}
