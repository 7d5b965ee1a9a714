//! Value types consumed and produced by the sizing engine.
//!
//! Capacities are expressed in **gigabytes (GB, base-10)** and compute in
//! physical cores. Every type here is a plain value: nothing is cached and
//! nothing outlives a single sizing call.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SizingError;

/// Failures-to-tolerate policy applied to the cluster's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResiliencyPolicy {
    /// Survive one node failure (RAID-1 mirroring).
    #[default]
    Ftt1,
    /// Survive two simultaneous node failures.
    Ftt2,
    /// Survive three simultaneous node failures.
    Ftt3,
}

impl ResiliencyPolicy {
    /// Number of failures tolerated (1, 2 or 3).
    pub fn ftt_level(self) -> u32 {
        match self {
            ResiliencyPolicy::Ftt1 => 1,
            ResiliencyPolicy::Ftt2 => 2,
            ResiliencyPolicy::Ftt3 => 3,
        }
    }

    /// Share of raw capacity left usable after redundancy overhead.
    pub fn resiliency_fraction(self) -> f64 {
        match self {
            ResiliencyPolicy::Ftt1 => 0.5,
            ResiliencyPolicy::Ftt2 => 0.33,
            ResiliencyPolicy::Ftt3 => 0.25,
        }
    }

    /// Node floor required to keep quorum: `2 * FTT + 1`.
    pub fn minimum_nodes(self) -> u32 {
        2 * self.ftt_level() + 1
    }

    /// Inflation applied to storage demand: `FTT + 1` copies.
    pub fn storage_overhead_multiplier(self) -> f64 {
        f64::from(self.ftt_level() + 1)
    }
}

impl FromStr for ResiliencyPolicy {
    type Err = SizingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "ftt1" => Ok(ResiliencyPolicy::Ftt1),
            "2" | "ftt2" => Ok(ResiliencyPolicy::Ftt2),
            "3" | "ftt3" => Ok(ResiliencyPolicy::Ftt3),
            other => Err(SizingError::InvalidResiliency(other.to_string())),
        }
    }
}

/// Space-efficiency features enabled on the datastore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataReduction {
    /// Deduplication enabled.
    #[serde(default)]
    pub dedup: bool,
    /// Compression enabled.
    #[serde(default)]
    pub compression: bool,
}

impl DataReduction {
    /// Usable-capacity multiplier.
    ///
    /// Deduplication only counts together with compression; on its own it
    /// contributes nothing (`1.0`).
    pub fn multiplier(self) -> f64 {
        match (self.dedup, self.compression) {
            (true, true) => 2.0,
            (false, true) => 1.5,
            _ => 1.0,
        }
    }
}

/// Per-node hardware and cluster-wide policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Physical cores per node (`cores_per_socket * sockets_per_node`).
    pub cores_per_node: f64,
    /// Memory per node, GB (base-10).
    pub memory_per_node_gb: f64,
    /// Raw disk capacity per node, before redundancy and data reduction.
    ///
    /// Formula: `disk_count * disk_capacity_gb`
    pub raw_storage_per_node_gb: f64,
    /// Failures to tolerate; sets the node floor and the usable fraction.
    #[serde(default)]
    pub resiliency_policy: ResiliencyPolicy,
    /// Usable-capacity multiplier from dedup and compression.
    #[serde(default)]
    pub data_reduction: DataReduction,
    /// Hold back 30% of usable capacity for internal operations.
    #[serde(default)]
    pub operational_reserve_enabled: bool,
    /// Utilization ceiling, in percent.
    #[serde(default = "default_max_utilization")]
    pub max_utilization_percent: f64,
}

fn default_max_utilization() -> f64 {
    90.0
}

impl ClusterConfig {
    /// Builds a config from the hardware a node is ordered with.
    ///
    /// Policy fields start at their defaults (FTT1, no data reduction, no
    /// reserve, 90% ceiling).
    pub fn from_hardware(
        cores_per_socket: u32,
        sockets_per_node: u32,
        memory_per_node_gb: f64,
        disk_count: u32,
        disk_capacity_gb: f64,
    ) -> Self {
        Self {
            cores_per_node: f64::from(cores_per_socket) * f64::from(sockets_per_node),
            memory_per_node_gb,
            raw_storage_per_node_gb: f64::from(disk_count) * disk_capacity_gb,
            resiliency_policy: ResiliencyPolicy::default(),
            data_reduction: DataReduction::default(),
            operational_reserve_enabled: false,
            max_utilization_percent: default_max_utilization(),
        }
    }

    pub fn with_resiliency(mut self, policy: ResiliencyPolicy) -> Self {
        self.resiliency_policy = policy;
        self
    }

    pub fn with_data_reduction(mut self, dedup: bool, compression: bool) -> Self {
        self.data_reduction = DataReduction { dedup, compression };
        self
    }

    pub fn with_operational_reserve(mut self, enabled: bool) -> Self {
        self.operational_reserve_enabled = enabled;
        self
    }

    pub fn with_max_utilization(mut self, percent: f64) -> Self {
        self.max_utilization_percent = percent;
        self
    }

    /// Range checks the sizing form applies before calling the engine.
    ///
    /// # Errors
    ///
    /// - any per-node capacity is `<= 0` (or not finite)
    /// - `max_utilization_percent` is outside `[50, 100]`
    pub fn validate(&self) -> Result<(), SizingError> {
        let capacities = [
            ("cores_per_node", self.cores_per_node),
            ("memory_per_node_gb", self.memory_per_node_gb),
            ("raw_storage_per_node_gb", self.raw_storage_per_node_gb),
        ];
        for (field, value) in capacities {
            if !value.is_finite() || value <= 0.0 {
                return Err(SizingError::NonPositiveCapacity { field, value });
            }
        }
        if !(50.0..=100.0).contains(&self.max_utilization_percent) {
            return Err(SizingError::UtilizationOutOfRange(
                self.max_utilization_percent,
            ));
        }
        Ok(())
    }
}

/// One workload profile: `count` identical instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadUnit {
    /// Free-form label, echoed in validation errors.
    #[serde(default)]
    pub name: String,
    /// Virtual CPUs per instance.
    pub vcpus: f64,
    /// Memory per instance, GB (base-10).
    pub memory_gb: f64,
    /// Storage per instance, GB (base-10), before redundancy.
    pub storage_gb: f64,
    /// Number of identical instances.
    #[serde(default = "default_count")]
    pub count: u32,
    /// vCPU to physical core consolidation ratio.
    #[serde(default = "default_core_ratio")]
    pub core_ratio: f64,
}

fn default_count() -> u32 {
    1
}

fn default_core_ratio() -> f64 {
    1.0
}

impl WorkloadUnit {
    pub fn new(vcpus: f64, memory_gb: f64, storage_gb: f64, count: u32) -> Self {
        Self {
            name: String::new(),
            vcpus,
            memory_gb,
            storage_gb,
            count,
            core_ratio: default_core_ratio(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_core_ratio(mut self, ratio: f64) -> Self {
        self.core_ratio = ratio;
        self
    }

    /// Ratio actually applied; non-positive ratios fall back to 1:1.
    fn effective_core_ratio(&self) -> f64 {
        if self.core_ratio > 0.0 {
            self.core_ratio
        } else {
            1.0
        }
    }

    /// # Errors
    ///
    /// Returns [`SizingError::NegativeDemand`] if any per-instance figure is
    /// negative or not finite.
    pub fn validate(&self) -> Result<(), SizingError> {
        let figures = [
            ("vcpus", self.vcpus),
            ("memory_gb", self.memory_gb),
            ("storage_gb", self.storage_gb),
        ];
        for (field, value) in figures {
            if !value.is_finite() || value < 0.0 {
                return Err(SizingError::NegativeDemand {
                    workload: self.name.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Aggregate demand of a workload list.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkloadDemand {
    /// `sum(vcpus * count)`
    pub vcpu_total: f64,
    /// `sum(vcpus * count / core_ratio)`: physical cores consumed.
    pub effective_vcpu: f64,
    /// `sum(memory_gb * count)`, GB.
    pub memory_gb: f64,
    /// `sum(storage_gb * count)`, GB, before the `FTT + 1` inflation.
    pub storage_gb: f64,
    /// `sum(count)`: total number of instances across all units.
    pub workload_units: u64,
}

impl WorkloadDemand {
    /// Sums a workload list. An empty list is zero demand.
    pub fn from_units(units: &[WorkloadUnit]) -> Self {
        units.iter().fold(Self::default(), |acc, u| {
            let count = f64::from(u.count);
            let vcpus = u.vcpus * count;
            Self {
                vcpu_total: acc.vcpu_total + vcpus,
                effective_vcpu: acc.effective_vcpu + vcpus / u.effective_core_ratio(),
                memory_gb: acc.memory_gb + u.memory_gb * count,
                storage_gb: acc.storage_gb + u.storage_gb * count,
                workload_units: acc.workload_units.saturating_add(u64::from(u.count)),
            }
        })
    }
}

/// Node count each constraint would need on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodesRequiredBy {
    /// `2 * FTT + 1`
    pub resiliency: u64,
    /// `ceil(workload_units / 100)`
    pub workload_count: u64,
    /// `ceil(effective_vcpu / cores_per_node)`
    pub compute: u64,
    /// `ceil(memory_gb / memory_per_node_gb)`
    pub memory: u64,
    /// Node count the storage convergence loop settled on.
    pub storage: u64,
}

/// Utilization at `minimum_nodes`, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Utilization {
    /// `effective_vcpu / total_cores * 100`
    pub cpu: f64,
    /// `memory_gb / total_memory_gb * 100`
    pub memory: f64,
    /// `storage_demand_gb / usable_storage_gb * 100`
    pub storage: f64,
}

/// Workload instances the cluster could host at `minimum_nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxSupportableWorkloadUnits {
    /// `floor(total_cores / effective_vcpu * workload_units)`
    pub by_cpu: u64,
    /// `floor(total_memory_gb / memory_gb * workload_units)`
    pub by_memory: u64,
    /// `floor(usable_storage_gb / storage_demand_gb * workload_units)`
    pub by_storage: u64,
    /// Smallest of the three and `minimum_nodes * 100`.
    pub overall: u64,
}

/// Cluster totals at `minimum_nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterCapacity {
    /// `minimum_nodes * cores_per_node`
    pub total_cores: f64,
    /// `minimum_nodes * memory_per_node_gb`, GB.
    pub total_memory_gb: f64,
    /// Usable storage at `minimum_nodes`, GB.
    pub usable_storage_gb: f64,
    /// Storage demand after the `FTT + 1` inflation.
    pub storage_demand_gb: f64,
}

/// Outcome of one sizing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingResult {
    /// Smallest node count meeting every constraint.
    pub minimum_nodes: u64,
    /// `minimum_nodes + 1` (N+1 spare).
    pub recommended_nodes: u64,
    pub nodes_required_by: NodesRequiredBy,
    pub utilization: Utilization,
    /// Ceiling the utilization figures are checked against, in percent.
    pub max_utilization_percent: f64,
    pub capacity: ClusterCapacity,
    pub max_supportable_workload_units: MaxSupportableWorkloadUnits,
    /// Storage convergence steps taken.
    pub iterations: u32,
    /// Iteration-limit and over-ceiling messages, in that order.
    pub warnings: Vec<String>,
}

/// A cluster configuration together with the workloads it must host.
///
/// This is the shape of the JSON scenario files accepted by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub cluster: ClusterConfig,
    /// Workload profiles to host; may be empty.
    #[serde(default)]
    pub workloads: Vec<WorkloadUnit>,
}

impl Scenario {
    /// Parses and validates a scenario.
    ///
    /// # Errors
    ///
    /// Malformed JSON, or any value rejected by [`Scenario::validate`].
    pub fn from_json(json: &str) -> Result<Self, SizingError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), SizingError> {
        self.cluster.validate()?;
        self.workloads.iter().try_for_each(WorkloadUnit::validate)
    }

    pub fn demand(&self) -> WorkloadDemand {
        WorkloadDemand::from_units(&self.workloads)
    }
}
