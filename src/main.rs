use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use cluster_sizing_planner::{
    compute_minimum_nodes, ClusterConfig, ResiliencyPolicy, Scenario, WorkloadDemand, WorkloadUnit,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output format for the sizing result.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Plain-text report (default)
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Command-line arguments for the Cluster Sizing Planner.
///
/// Defaults describe a 2 x 12-core node with 768 GB RAM and 24 x 960 GB
/// disks, FTT1 with compression, sized for one small VM.
#[derive(Debug, Parser)]
#[command(name = "cluster-sizing-planner", version)]
#[command(about = "Cluster Sizing Planner: minimum node count for an HCI cluster")]
struct Args {
    /// JSON scenario file with `cluster` and `workloads`.
    /// Overrides the hardware, policy and workload flags.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Physical cores per CPU socket.
    #[arg(long, default_value_t = 12)]
    cores_per_socket: u32,

    /// CPU sockets per node.
    #[arg(long, default_value_t = 2)]
    sockets_per_node: u32,

    /// Memory per node in gigabytes.
    #[arg(long, default_value_t = 768.0)]
    memory_per_node_gb: f64,

    /// Capacity disks per node.
    #[arg(long, default_value_t = 24)]
    disk_count: u32,

    /// Size of one capacity disk in gigabytes.
    #[arg(long, default_value_t = 960.0)]
    disk_capacity_gb: f64,

    /// Failures to tolerate (1, 2 or 3).
    #[arg(long, default_value = "1")]
    ftt: ResiliencyPolicy,

    /// Enable deduplication (only effective together with compression).
    #[arg(long)]
    dedup: bool,

    /// Enable compression.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    compression: bool,

    /// Hold back 30% of usable capacity for internal operations.
    #[arg(long)]
    operational_reserve: bool,

    /// Maximum utilization per resource, in percent (50-100).
    #[arg(long, default_value_t = 90.0)]
    max_utilization: f64,

    /// Virtual CPUs per workload instance.
    #[arg(long, default_value_t = 2.0)]
    vcpus: f64,

    /// Memory per workload instance in gigabytes.
    #[arg(long, default_value_t = 4.0)]
    memory_gb: f64,

    /// Storage per workload instance in gigabytes.
    #[arg(long, default_value_t = 1024.0)]
    storage_gb: f64,

    /// Number of workload instances.
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// vCPU to physical core consolidation ratio.
    #[arg(long, default_value_t = 2.0)]
    core_ratio: f64,

    /// Output format.
    #[arg(long, short, env = "CSP_FORMAT", default_value = "table")]
    format: OutputFormat,

    /// Log sizing steps to stderr.
    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    fn scenario(&self) -> Result<Scenario> {
        if let Some(path) = &self.scenario {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read scenario {}", path.display()))?;
            let scenario = Scenario::from_json(&content)
                .with_context(|| format!("failed to load scenario {}", path.display()))?;
            debug!(path = %path.display(), workloads = scenario.workloads.len(), "scenario loaded");
            return Ok(scenario);
        }

        let cluster = ClusterConfig::from_hardware(
            self.cores_per_socket,
            self.sockets_per_node,
            self.memory_per_node_gb,
            self.disk_count,
            self.disk_capacity_gb,
        )
        .with_resiliency(self.ftt)
        .with_data_reduction(self.dedup, self.compression)
        .with_operational_reserve(self.operational_reserve)
        .with_max_utilization(self.max_utilization);

        let scenario = Scenario {
            cluster,
            workloads: vec![
                WorkloadUnit::new(self.vcpus, self.memory_gb, self.storage_gb, self.count)
                    .with_core_ratio(self.core_ratio),
            ],
        };
        scenario.validate()?;
        Ok(scenario)
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: &Args) -> Result<()> {
    let scenario = args.scenario()?;
    let demand: WorkloadDemand = scenario.demand();
    let result = compute_minimum_nodes(&demand, &scenario.cluster);

    info!(
        minimum_nodes = result.minimum_nodes,
        recommended_nodes = result.recommended_nodes,
        warnings = result.warnings.len(),
        "sizing complete"
    );

    match args.format {
        OutputFormat::Table => println!("{}", result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

fn main() {
    let a = Args::parse();
    init_tracing(a.verbose);

    if let Err(e) = run(&a) {
        eprintln!("Error: {:#}", e);
        std::process::exit(2);
    }
}
