use thiserror::Error;

/// Input rejected before it reaches the sizing engine.
///
/// The engine itself never fails; these errors come from the range checks
/// in [`ClusterConfig::validate`](crate::ClusterConfig::validate) and
/// [`WorkloadUnit::validate`](crate::WorkloadUnit::validate), and from
/// loading scenario files.
#[derive(Debug, Error)]
pub enum SizingError {
    #[error("{field} must be > 0 (got {value})")]
    NonPositiveCapacity { field: &'static str, value: f64 },

    #[error("max utilization must be in [50, 100] percent (got {0})")]
    UtilizationOutOfRange(f64),

    #[error("resiliency policy must be FTT 1, 2 or 3 (got {0:?})")]
    InvalidResiliency(String),

    #[error("workload {workload:?}: {field} must be >= 0 (got {value})")]
    NegativeDemand {
        workload: String,
        field: &'static str,
        value: f64,
    },

    #[error("invalid scenario: {0}")]
    Scenario(#[from] serde_json::Error),
}
