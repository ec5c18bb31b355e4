//! CLI smoke tests: every subcommand run against the built `pins` binary.

mod common;

use std::fs;
use std::path::Path;

use serde_json::Value;

const START: &str = "2025-03-01T08:00:00+07:00";

fn simulate_into(home: &Path, name: &str, count: &str) -> String {
    let path = home.join(name);
    let out = path.to_string_lossy().to_string();
    let result = common::run_cli_case(
        "simulate_into",
        home,
        &["simulate", "--count", count, "--seed", "7", "--start", START, "--out", out.as_str()],
    );
    assert!(
        result.status.success(),
        "simulate failed; log: {}",
        result.log_path.display()
    );
    out
}

#[test]
fn help_command_prints_usage() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case("help_command_prints_usage", home.path(), &["--help"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(
        result.stdout.contains("Usage: pins [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn subcommand_help_flags_work() {
    let home = tempfile::tempdir().unwrap();
    for sub in ["report", "uptime", "variance", "simulate", "config", "completions"] {
        let result = common::run_cli_case("subcommand_help", home.path(), &[sub, "--help"]);
        assert!(
            result.status.success(),
            "{sub} --help failed; log: {}",
            result.log_path.display()
        );
    }
}

#[test]
fn completions_command_generates_shell_script() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case("completions_bash", home.path(), &["completions", "bash"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("pins"), "log: {}", result.log_path.display());
}

#[test]
fn simulate_writes_requested_record_count() {
    let home = tempfile::tempdir().unwrap();
    let out = simulate_into(home.path(), "sim.jsonl", "24");
    let content = fs::read_to_string(&out).unwrap();
    let lines: Vec<Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 24);
    assert!(lines[0]["source_key"].as_str().unwrap().starts_with("G5|M"));
    assert!(lines[0]["payload"]["waveforms"].is_array());
}

#[test]
fn simulate_to_stdout_is_jsonl() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case(
        "simulate_stdout",
        home.path(),
        &["simulate", "--count", "6", "--seed", "1", "--start", START, "--line", "A1"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert_eq!(result.stdout.lines().count(), 6);
    assert!(result.stdout.contains("\"A1|M1|L\""));
}

#[test]
fn report_json_covers_simulated_records() {
    let home = tempfile::tempdir().unwrap();
    let records = simulate_into(home.path(), "sim.jsonl", "40");
    let result = common::run_cli_case(
        "report_json",
        home.path(),
        &["report", "--records", records.as_str(), "--start", "2025-03-01", "--end", "2025-03-01", "--json"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let payload = result.json();
    assert_eq!(payload["command"], "report");
    let dash = &payload["dashboard"];
    assert_eq!(dash["records"], 40);
    assert_eq!(dash["malformed_payloads"], 0);
    assert_eq!(dash["machines"].as_array().unwrap().len(), 4);
    let online = dash["uptime"]["split"]["online"].as_f64().unwrap();
    let offline = dash["uptime"]["split"]["offline"].as_f64().unwrap();
    assert!((online + offline - 100.0).abs() < 0.02, "{online} + {offline}");
    assert_eq!(dash["average_pressure"]["labels"].as_array().unwrap().len(), 4);
}

#[test]
fn report_machine_filter_narrows_snapshot() {
    let home = tempfile::tempdir().unwrap();
    let records = simulate_into(home.path(), "sim.jsonl", "40");
    let result = common::run_cli_case(
        "report_machine_filter",
        home.path(),
        &[
            "report", "--records", records.as_str(), "--start", "2025-03-01", "--end", "2025-03-01",
            "--machine", "G5|M2", "--current-reading", "median",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let machines = result.json()["dashboard"]["machines"].clone();
    let machines = machines.as_array().unwrap();
    assert_eq!(machines.len(), 1);
    assert_eq!(machines[0]["machine"], "G5|M2");
}

#[test]
fn report_writes_run_log() {
    let home = tempfile::tempdir().unwrap();
    let records = simulate_into(home.path(), "sim.jsonl", "10");
    let result = common::run_cli_case(
        "report_run_log",
        home.path(),
        &["report", "--records", records.as_str(), "--start", "2025-03-01", "--end", "2025-03-01"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let log = fs::read_to_string(home.path().join("runs.jsonl")).unwrap();
    let report_line = log
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).unwrap())
        .find(|entry| entry["event"] == "report_generated")
        .expect("report_generated entry");
    assert_eq!(report_line["command"], "report");
    assert_eq!(report_line["records"], 10);

    let config = common::run_cli_case("report_run_log_config", home.path(), &["config", "--json"]);
    assert!(config.status.success(), "log: {}", config.log_path.display());
    assert_eq!(report_line["config_hash"], config.json()["hash"]);
}

#[test]
fn uptime_from_records_and_status_log() {
    let home = tempfile::tempdir().unwrap();
    let records = home.path().join("records.jsonl");
    fs::write(
        &records,
        concat!(
            r#"{"timestamp":"2025-03-01T10:00:00+07:00","source_key":"G5|M1|L","payload":1}"#, "\n",
            r#"{"timestamp":"2025-03-01T10:05:00+07:00","source_key":"G5|M1|L","payload":1}"#, "\n",
        ),
    )
    .unwrap();
    let status = home.path().join("status.jsonl");
    fs::write(
        &status,
        concat!(
            r#"{"logged_at":"2025-03-01T10:00:00+07:00","source_key":"G5|M1","status":"online"}"#, "\n",
            r#"{"logged_at":"2025-03-01T10:06:00+07:00","source_key":"G5|M1","status":"offline","duration_secs":360}"#, "\n",
        ),
    )
    .unwrap();

    let result = common::run_cli_case(
        "uptime_both",
        home.path(),
        &[
            "uptime",
            "--records",
            records.to_str().unwrap(),
            "--status-log",
            status.to_str().unwrap(),
            "--start",
            "2025-03-01T10:00:00+07:00",
            "--end",
            "2025-03-01T10:10:00+07:00",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let payload = result.json();
    // 10:00 -> 10:05 plus the 10:05 -> 10:10 tail, both over the 120s threshold.
    assert_eq!(payload["activity"]["downtime_secs"], 600);
    let device = &payload["devices"][0];
    assert_eq!(device["device"], "G5|M1");
    assert_eq!(device["online_secs"], 360);
    assert_eq!(device["offline_secs"], 240);
    assert_eq!(device["current_status"], "offline");
    assert_eq!(device["online_held_secs"], 360);
}

#[test]
fn uptime_without_input_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case("uptime_no_input", home.path(), &["uptime"]);
    assert_eq!(result.status.code(), Some(2), "log: {}", result.log_path.display());
}

#[test]
fn variance_reports_zones_and_chart() {
    let home = tempfile::tempdir().unwrap();
    let readings = home.path().join("zones.jsonl");
    fs::write(
        &readings,
        concat!(
            r#"{"group":"A","values":[76,73,68,63,58,53,43,43]}"#, "\n",
            r#"{"group":"B","values":[80,70,null,63,58,53,43,50]}"#, "\n",
        ),
    )
    .unwrap();

    let result = common::run_cli_case(
        "variance_zones",
        home.path(),
        &["variance", "--readings", readings.to_str().unwrap(), "--cutoffs", "wide"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let payload = result.json();
    assert_eq!(payload["report"]["readings"], 2);
    assert_eq!(payload["report"]["zones"].as_array().unwrap().len(), 8);
    assert_eq!(payload["report"]["groups"].as_array().unwrap().len(), 2);
    assert_eq!(payload["chart"]["labels"][0], "Zone 1");
}

#[test]
fn variance_rejects_bad_cutoffs() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case(
        "variance_bad_cutoffs",
        home.path(),
        &["variance", "--readings", "zones.jsonl", "--cutoffs", "9,2"],
    );
    assert!(!result.status.success(), "log: {}", result.log_path.display());
}

#[test]
fn config_json_reports_defaults_and_hash() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case("config_json", home.path(), &["config", "--json"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let payload = result.json();
    assert_eq!(payload["exists"], false);
    assert_eq!(payload["hash"].as_str().unwrap().len(), 16);
    assert_eq!(payload["config"]["window"]["utc_offset"], "+07:00");
}

#[test]
fn explicit_missing_config_exits_with_user_error() {
    let home = tempfile::tempdir().unwrap();
    let missing = home.path().join("absent.toml");
    let result = common::run_cli_case(
        "missing_config",
        home.path(),
        &["config", "--config", missing.to_str().unwrap()],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("PIN-1002"), "log: {}", result.log_path.display());
}

#[test]
fn inverted_window_exits_with_user_error() {
    let home = tempfile::tempdir().unwrap();
    let records = simulate_into(home.path(), "sim.jsonl", "4");
    let result = common::run_cli_case(
        "inverted_window",
        home.path(),
        &["report", "--records", records.as_str(), "--start", "2025-03-02", "--end", "2025-03-01"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("PIN-2001"), "log: {}", result.log_path.display());
}

#[test]
fn missing_records_file_exits_with_runtime_error() {
    let home = tempfile::tempdir().unwrap();
    let absent = home.path().join("absent.jsonl");
    let result = common::run_cli_case(
        "missing_records",
        home.path(),
        &["report", "--records", absent.to_str().unwrap()],
    );
    assert_eq!(result.status.code(), Some(2), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("PIN-3002"), "log: {}", result.log_path.display());
}
