//! CLI integration tests

use serde_json::{json, Value};
use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

const T0: i64 = 1_700_000_000;

/// Job 3 on components 1..=2, idle components 30..=33
fn telemetry_dump() -> NamedTempFile {
    let mut meminfo = Vec::new();
    for component in 1..=2 {
        for i in 0..3 {
            meminfo.push(json!({
                "job_id": 3, "component_id": component, "timestamp": T0 + i,
                "MemTotal": 1000.0, "MemAvailable": 400.0 + component as f64 * 100.0
            }));
        }
    }
    for component in 30..=33 {
        meminfo.push(json!({
            "job_id": 0, "component_id": component, "timestamp": T0,
            "MemTotal": 1000.0, "MemAvailable": 1000.0 - (component - 29) as f64 * 100.0
        }));
    }
    let dump = json!({
        "tables": {
            "meminfo": meminfo,
            "mt-slurm": [{"job_id": 3, "job_start": T0, "job_end": T0 + 2}]
        }
    });

    let mut file = NamedTempFile::new().expect("Failed to create dump");
    write!(file, "{}", dump).expect("Failed to write dump");
    file
}

fn graf(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_graf"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("GRAF_DATA")
        .output()
        .expect("Failed to execute command")
}

fn graf_json(dump: &NamedTempFile, args: &[&str]) -> Value {
    let path = dump.path().to_str().expect("utf-8 path");
    let mut full = vec!["--data", path, "--format", "json"];
    full.extend_from_slice(args);
    let output = graf(&full);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("JSON output")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = graf(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("series"), "Should show series command");
    assert!(stdout.contains("rank"), "Should show rank command");
    assert!(stdout.contains("summary"), "Should show summary command");
    assert!(stdout.contains("--data"), "Should show data option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = graf(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("graf"), "Should show binary name");
}

#[test]
fn test_series_json() {
    let dump = telemetry_dump();
    let body = graf_json(&dump, &["series", "--job", "3", "--start", &T0.to_string(), "--end", &(T0 + 2).to_string()]);

    assert_eq!(body[0]["target"], "min_MemAvailable");
    assert_eq!(body[0]["datapoints"][0], json!([500.0, T0 * 1000]));
    assert_eq!(body[1]["datapoints"][2], json!([550.0, (T0 + 2) * 1000]));
    assert_eq!(body[2]["datapoints"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_series_without_job_json_is_sentinel() {
    let dump = telemetry_dump();
    let body = graf_json(&dump, &["series", "--job", "0", "--start", &T0.to_string()]);
    assert_eq!(
        body,
        json!([{"target": "Error: Please specify valid job_id", "datapoints": []}])
    );
}

#[test]
fn test_series_without_job_table_fails() {
    let dump = telemetry_dump();
    let path = dump.path().to_str().expect("utf-8 path");
    let output = graf(&["--data", path, "series", "--job", "0", "--start", "0"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Please specify valid job_id"));
}

#[test]
fn test_rank_idle_low_json() {
    let dump = telemetry_dump();
    let body = graf_json(&dump, &["rank", "--start", &T0.to_string(), "--idle", "--threshold", "-2"]);

    let columns = body["columns"].as_array().expect("table output");
    let components = columns
        .iter()
        .find(|c| c["name"] == "component_id")
        .expect("component_id column");
    // idle ratios 0.1..0.4, keep those below sorted[2]
    assert_eq!(components["values"], json!([30, 31]));
}

#[test]
fn test_summary_table() {
    let dump = telemetry_dump();
    let path = dump.path().to_str().expect("utf-8 path");
    let output = graf(&["--data", path, "summary", "--job", "3"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    for label in ["Min", "Max", "Stdd-2", "Mean", "Stdd+2"] {
        assert!(stdout.contains(label), "Should show {} row", label);
    }
}

#[test]
fn test_missing_dump_fails() {
    let output = graf(&["--data", "/nonexistent/telemetry.json", "summary", "--job", "3"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read telemetry dump"));
}

/// Test invalid command handling
#[test]
fn test_invalid_command() {
    let output = graf(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");
}

/// Test missing required argument
#[test]
fn test_missing_argument() {
    let output = graf(&["summary"]);
    assert!(!output.status.success(), "Missing --job should fail");
}
