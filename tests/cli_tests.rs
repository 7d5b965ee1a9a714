//! CLI integration tests

use std::io::Write;
use std::process::{Command, Output};

fn planner(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cluster-sizing-planner"))
        .args(args)
        .env_remove("CSP_FORMAT")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn json_output(args: &[&str]) -> serde_json::Value {
    let output = planner(args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = planner(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("--scenario"), "Should show scenario option");
    assert!(stdout.contains("--ftt"), "Should show ftt option");
    assert!(stdout.contains("--max-utilization"), "Should show utilization option");
}

/// Default flags describe one small VM on the reference node
#[test]
fn test_default_report() {
    let output = planner(&[]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("=== Cluster Sizing Planner ==="));
    assert!(stdout.contains("Minimum nodes:     3"));
    assert!(stdout.contains("Recommended (N+1): 4"));
}

#[test]
fn test_json_output() {
    let v = json_output(&["--format", "json", "--ftt", "2"]);

    assert_eq!(v["minimum_nodes"], 5);
    assert_eq!(v["recommended_nodes"], 6);
    assert_eq!(v["nodes_required_by"]["resiliency"], 5);
    assert!(v["warnings"].as_array().unwrap().is_empty());
}

#[test]
fn test_compression_can_be_disabled() {
    let with = json_output(&["-f", "json"]);
    let without = json_output(&["-f", "json", "--compression", "false"]);

    let usable_with = with["capacity"]["usable_storage_gb"].as_f64().unwrap();
    let usable_without = without["capacity"]["usable_storage_gb"].as_f64().unwrap();
    assert!((usable_with / usable_without - 1.5).abs() < 1e-9);
}

#[test]
fn test_rejects_invalid_ftt() {
    let output = planner(&["--ftt", "4"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_rejects_low_utilization_ceiling() {
    let output = planner(&["--max-utilization", "40"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("max utilization must be in [50, 100]"), "{stderr}");
}

#[test]
fn test_scenario_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "cluster": {{
                "cores_per_node": 24,
                "memory_per_node_gb": 768,
                "raw_storage_per_node_gb": 100,
                "max_utilization_percent": 90
            }},
            "workloads": [
                {{ "name": "archive", "vcpus": 1, "memory_gb": 1, "storage_gb": 1000, "count": 2 }}
            ]
        }}"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap();
    let v = json_output(&["--scenario", path, "--format", "json"]);

    // 2000 GB * 2 over 50 GB usable per node at <= 90%
    assert_eq!(v["minimum_nodes"], 89);
    assert_eq!(v["iterations"], 86);
}

#[test]
fn test_missing_scenario_file() {
    let output = planner(&["--scenario", "/nonexistent/cluster.json"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("failed to read scenario"), "{stderr}");
}

/// Instance counts whose sum exceeds `u32::MAX` are sized, not rejected
#[test]
fn test_scenario_with_billions_of_instances() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "cluster": {{
                "cores_per_node": 24,
                "memory_per_node_gb": 768,
                "raw_storage_per_node_gb": 23040
            }},
            "workloads": [
                {{ "vcpus": 1, "memory_gb": 1, "storage_gb": 1, "count": 3000000000 }},
                {{ "vcpus": 1, "memory_gb": 1, "storage_gb": 1, "count": 3000000000 }}
            ]
        }}"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap();
    let v = json_output(&["--scenario", path, "--format", "json"]);

    // 6e9 vCPUs over 24-core nodes
    assert_eq!(v["minimum_nodes"], 250_000_000u64);
    assert_eq!(v["recommended_nodes"], 250_000_001u64);
}

#[test]
fn test_huge_core_count_flag() {
    let v = json_output(&["--cores-per-socket", "3000000000", "--format", "json"]);

    assert_eq!(v["minimum_nodes"], 3);
    assert_eq!(v["capacity"]["total_cores"], 18e9);
}
