//! Cluster sizing engine.
//!
//! Pure functions: every call recomputes from scratch and nothing is kept
//! between calls. Callers re-invoke after each input change.

use tracing::{debug, warn};

use crate::model::{
    ClusterCapacity, ClusterConfig, MaxSupportableWorkloadUnits, NodesRequiredBy, SizingResult,
    Utilization, WorkloadDemand,
};

/// Conservative cap on workload instances hosted per node.
pub const MAX_WORKLOAD_UNITS_PER_NODE: u64 = 100;

/// Largest value any single node floor is allowed to take.
///
/// Floors derived from demand are clamped here, so the convergence steps
/// and the N+1 spare never overflow.
pub const MAX_NODE_FLOOR: u64 = u32::MAX as u64;

/// Upper bound on storage convergence steps.
pub const MAX_CONVERGENCE_ITERATIONS: u32 = 100;

/// Share of usable capacity left when the operational reserve is on.
pub const OPERATIONAL_RESERVE_FACTOR: f64 = 0.7;

/// Warning emitted when storage convergence gives up.
pub const ITERATION_LIMIT_WARNING: &str = "Maximum iteration limit reached; review configuration";

/// Usable storage, in GB, across `node_count` nodes.
///
/// # Formula
///
/// ```text
/// raw_total        = raw_storage_per_node_gb * node_count
/// after_resiliency = raw_total * resiliency_fraction      (0.5 / 0.33 / 0.25)
/// after_reduction  = after_resiliency * reduction_multiplier (2.0 / 1.5 / 1.0)
/// usable           = after_reduction * 0.7 if operational reserve, else after_reduction
/// ```
///
/// `node_count == 0` yields `0.0`.
pub fn compute_usable_capacity_per_cluster(config: &ClusterConfig, node_count: u64) -> f64 {
    if node_count == 0 {
        return 0.0;
    }

    let raw_total = config.raw_storage_per_node_gb * node_count as f64;
    let after_resiliency = raw_total * config.resiliency_policy.resiliency_fraction();
    let after_reduction = after_resiliency * config.data_reduction.multiplier();

    if config.operational_reserve_enabled {
        after_reduction * OPERATIONAL_RESERVE_FACTOR
    } else {
        after_reduction
    }
}

/// Finds the smallest node count that satisfies every resource dimension
/// at once, then reports utilization and headroom at that count.
///
/// # Algorithm
///
/// ```text
/// resiliency     = 2 * FTT + 1
/// workload_count = ceil(workload_units / 100)
/// compute        = ceil(effective_vcpu / cores_per_node)
/// memory         = ceil(memory_gb / memory_per_node_gb)
/// candidate      = max(resiliency, workload_count, compute, memory)
///
/// storage_util(n) = storage_gb * (FTT + 1) / usable(n) * 100
/// while storage_util(candidate) > max_utilization_percent:   (at most 100 steps)
///     candidate += 1
///
/// minimum_nodes     = candidate
/// recommended_nodes = candidate + 1
/// ```
///
/// Demand-driven floors are clamped to [`MAX_NODE_FLOOR`].
///
/// Storage overhead is applied twice: demand is inflated by
/// `FTT + 1` and supply is shrunk by the resiliency fraction.
///
/// The function never fails. Unreachable storage targets stop after
/// [`MAX_CONVERGENCE_ITERATIONS`] steps with [`ITERATION_LIMIT_WARNING`];
/// utilization above the ceiling is reported through
/// [`SizingResult::warnings`].
///
/// # Examples
///
/// ```
/// use cluster_sizing_planner::{
///     compute_minimum_nodes, ClusterConfig, WorkloadDemand, WorkloadUnit,
/// };
///
/// let config = ClusterConfig::from_hardware(12, 2, 768.0, 24, 960.0)
///     .with_data_reduction(false, true);
/// let vm = WorkloadUnit::new(2.0, 4.0, 1024.0, 1).with_core_ratio(2.0);
/// let demand = WorkloadDemand::from_units(&[vm]);
///
/// let result = compute_minimum_nodes(&demand, &config);
///
/// assert_eq!(result.minimum_nodes, 3);
/// assert_eq!(result.recommended_nodes, 4);
/// assert!(result.utilization.storage < 90.0);
/// ```
pub fn compute_minimum_nodes(demand: &WorkloadDemand, config: &ClusterConfig) -> SizingResult {
    let policy = config.resiliency_policy;
    let ceiling = config.max_utilization_percent;
    let mut warnings = Vec::new();

    let nodes_for_resiliency = u64::from(policy.minimum_nodes());
    let nodes_for_workload_count = demand
        .workload_units
        .div_ceil(MAX_WORKLOAD_UNITS_PER_NODE)
        .min(MAX_NODE_FLOOR);
    let nodes_for_compute = nodes_to_fit(demand.effective_vcpu, config.cores_per_node);
    let nodes_for_memory = nodes_to_fit(demand.memory_gb, config.memory_per_node_gb);

    let start = nodes_for_resiliency
        .max(nodes_for_workload_count)
        .max(nodes_for_compute)
        .max(nodes_for_memory);

    debug!(
        resiliency = nodes_for_resiliency,
        workload_count = nodes_for_workload_count,
        compute = nodes_for_compute,
        memory = nodes_for_memory,
        start,
        "node floors computed"
    );

    let mut candidate = start;
    let mut iterations = 0;
    let mut storage_util = storage_utilization(demand, config, candidate);
    while storage_util > ceiling {
        if iterations >= MAX_CONVERGENCE_ITERATIONS {
            warn!(
                nodes = candidate,
                storage_utilization = storage_util,
                max_utilization = ceiling,
                "storage convergence hit iteration limit"
            );
            warnings.push(ITERATION_LIMIT_WARNING.to_string());
            break;
        }
        candidate += 1;
        iterations += 1;
        storage_util = storage_utilization(demand, config, candidate);
    }

    debug!(
        nodes = candidate,
        iterations,
        storage_utilization = storage_util,
        "storage convergence finished"
    );

    let minimum_nodes = candidate;
    let nodes = minimum_nodes as f64;

    let capacity = ClusterCapacity {
        total_cores: nodes * config.cores_per_node,
        total_memory_gb: nodes * config.memory_per_node_gb,
        usable_storage_gb: compute_usable_capacity_per_cluster(config, minimum_nodes),
        storage_demand_gb: inflated_storage_demand(demand, config),
    };

    let utilization = Utilization {
        cpu: percent_of(demand.effective_vcpu, capacity.total_cores),
        memory: percent_of(demand.memory_gb, capacity.total_memory_gb),
        storage: storage_util,
    };

    for (resource, value) in [
        ("CPU", utilization.cpu),
        ("Memory", utilization.memory),
        ("Storage", utilization.storage),
    ] {
        if value > ceiling {
            warnings.push(format!(
                "{resource} utilization {value:.1}% exceeds maximum {ceiling:.1}%"
            ));
        }
    }

    let count_cap = minimum_nodes * MAX_WORKLOAD_UNITS_PER_NODE;
    let units = demand.workload_units;
    let by_cpu = units_supported(capacity.total_cores, demand.effective_vcpu, units, count_cap);
    let by_memory = units_supported(capacity.total_memory_gb, demand.memory_gb, units, count_cap);
    let by_storage = units_supported(
        capacity.usable_storage_gb,
        capacity.storage_demand_gb,
        units,
        count_cap,
    );

    SizingResult {
        minimum_nodes,
        recommended_nodes: minimum_nodes + 1,
        nodes_required_by: NodesRequiredBy {
            resiliency: nodes_for_resiliency,
            workload_count: nodes_for_workload_count,
            compute: nodes_for_compute,
            memory: nodes_for_memory,
            storage: candidate,
        },
        utilization,
        max_utilization_percent: ceiling,
        capacity,
        max_supportable_workload_units: MaxSupportableWorkloadUnits {
            by_cpu,
            by_memory,
            by_storage,
            overall: by_cpu.min(by_memory).min(by_storage).min(count_cap),
        },
        iterations,
        warnings,
    }
}

fn nodes_to_fit(demand: f64, per_node: f64) -> u64 {
    if demand <= 0.0 {
        return 0;
    }
    // `as` saturates (NaN becomes 0), then the floor is clamped.
    ((demand / per_node).ceil() as u64).min(MAX_NODE_FLOOR)
}

fn inflated_storage_demand(demand: &WorkloadDemand, config: &ClusterConfig) -> f64 {
    demand.storage_gb * config.resiliency_policy.storage_overhead_multiplier()
}

fn storage_utilization(demand: &WorkloadDemand, config: &ClusterConfig, node_count: u64) -> f64 {
    percent_of(
        inflated_storage_demand(demand, config),
        compute_usable_capacity_per_cluster(config, node_count),
    )
}

fn percent_of(used: f64, capacity: f64) -> f64 {
    if used <= 0.0 {
        0.0
    } else if capacity <= 0.0 {
        f64::INFINITY
    } else {
        used / capacity * 100.0
    }
}

/// `floor(capacity / demand * units)`; a dimension with no demand is only
/// limited by the per-node count cap.
fn units_supported(capacity: f64, demand: f64, units: u64, count_cap: u64) -> u64 {
    if demand <= 0.0 || units == 0 {
        return count_cap;
    }
    (capacity / demand * units as f64).floor() as u64
}
