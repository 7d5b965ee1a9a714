#![doc = include_str!("../README.md")]

pub mod error;
pub mod model;
mod report;
pub mod sizing;

pub use error::SizingError;
pub use model::{
    ClusterCapacity, ClusterConfig, DataReduction, MaxSupportableWorkloadUnits, NodesRequiredBy,
    ResiliencyPolicy, Scenario, SizingResult, Utilization, WorkloadDemand, WorkloadUnit,
};
pub use sizing::{compute_minimum_nodes, compute_usable_capacity_per_cluster};
