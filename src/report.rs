use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::model::SizingResult;

fn fmt_gb(x: f64) -> String {
    format!("{:.1} GB", x)
}
fn fmt_tb(x: f64) -> String {
    format!("{:.2} TB", x / 1000.0)
}

fn fmt_pct(x: f64) -> String {
    if x.is_finite() {
        format!("{:.1}%", x)
    } else {
        "n/a".to_string()
    }
}

impl Display for SizingResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let by = &self.nodes_required_by;

        writeln!(f, "=== Cluster Sizing Planner ===")?;
        writeln!(f, "Nodes required by resiliency:     {}", by.resiliency)?;
        writeln!(f, "Nodes required by workload count: {}", by.workload_count)?;
        writeln!(f, "Nodes required by compute:        {}", by.compute)?;
        writeln!(f, "Nodes required by memory:         {}", by.memory)?;
        writeln!(
            f,
            "Nodes required by storage:        {} ({} convergence steps)",
            by.storage, self.iterations
        )?;
        writeln!(f)?;

        writeln!(f, "Minimum nodes:     {}", self.minimum_nodes)?;
        writeln!(f, "Recommended (N+1): {}", self.recommended_nodes)?;
        writeln!(f)?;

        writeln!(
            f,
            "Utilization at {} nodes (max {:.0}%):",
            self.minimum_nodes, self.max_utilization_percent
        )?;
        writeln!(f, "  CPU:     {}", fmt_pct(self.utilization.cpu))?;
        writeln!(f, "  Memory:  {}", fmt_pct(self.utilization.memory))?;
        writeln!(f, "  Storage: {}", fmt_pct(self.utilization.storage))?;
        writeln!(f)?;

        let cap = &self.capacity;
        writeln!(f, "Total cores:          {:.0}", cap.total_cores)?;
        writeln!(
            f,
            "Total memory:         {} ({})",
            fmt_gb(cap.total_memory_gb),
            fmt_tb(cap.total_memory_gb)
        )?;
        writeln!(
            f,
            "Usable storage:       {} ({})",
            fmt_gb(cap.usable_storage_gb),
            fmt_tb(cap.usable_storage_gb)
        )?;
        writeln!(
            f,
            "Storage demand (FTT): {} ({})",
            fmt_gb(cap.storage_demand_gb),
            fmt_tb(cap.storage_demand_gb)
        )?;
        writeln!(f)?;

        let max = &self.max_supportable_workload_units;
        writeln!(
            f,
            "Max supportable workloads: {} (cpu {}, memory {}, storage {})",
            max.overall, max.by_cpu, max.by_memory, max.by_storage
        )?;

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings:")?;
            for w in &self.warnings {
                writeln!(f, "  - {}", w)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn report_lists_nodes_and_warnings() {
        let config = ClusterConfig::from_hardware(12, 2, 768.0, 24, 960.0);
        let demand = WorkloadDemand::from_units(&[WorkloadUnit::new(500.0, 100.0, 0.0, 1)]);
        let text = compute_minimum_nodes(&demand, &config).to_string();

        assert!(text.contains("Minimum nodes:     21"));
        assert!(text.contains("Recommended (N+1): 22"));
        assert!(text.contains("Warnings:"));
        assert!(text.contains("CPU utilization 99.2% exceeds maximum 90.0%"));
    }

    #[test]
    fn report_without_warnings_has_no_warning_section() {
        let config = ClusterConfig::from_hardware(12, 2, 768.0, 24, 960.0);
        let text = compute_minimum_nodes(&WorkloadDemand::default(), &config).to_string();

        assert!(text.contains("Minimum nodes:     3"));
        assert!(text.contains("Usable storage:       34560.0 GB (34.56 TB)"));
        assert!(!text.contains("Warnings:"));
    }
}
