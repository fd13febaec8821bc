//! End-to-end tests for the sync-bench binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn sync_bench() -> Command {
    Command::cargo_bin("sync-bench").unwrap()
}

const FAST_RUN: &str = r#"
[experiment]
run_duration_ms = 300
drain_duration_ms = 300

[network]
sync_interval_ms = 20
fetch_latency_ms = 1
"#;

#[test]
fn missing_arguments_exit_with_wrong_args() {
    sync_bench()
        .args(["node", "a"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("WRONG_ARGS"));
}

#[test]
fn non_numeric_interval_is_wrong_args() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("a.log");
    sync_bench()
        .arg("node")
        .arg("a")
        .arg(&log)
        .arg("soon")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("WRONG_ARGS"));
    assert!(!log.exists());
}

#[test]
fn help_exits_cleanly() {
    sync_bench()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cluster"));
}

#[test]
fn invalid_identity_fails_before_logging() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("a.log");
    sync_bench()
        .arg("node")
        .arg("a::b")
        .arg(&log)
        .arg("100")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid node identity"));
    assert!(!log.exists());
}

#[test]
fn single_node_writes_event_log() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("a.log");
    let config = dir.path().join("bench.toml");
    fs::write(&config, FAST_RUN).unwrap();

    sync_bench()
        .arg("node")
        .arg("a")
        .arg(&log)
        .arg("50")
        .arg("--config")
        .arg(&config)
        .args(["--seed", "1"])
        .assert()
        .success();

    let content = fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert!(lines[0].ends_with("\"NODE_INIT::a\""), "{content}");
    assert!(content.contains("\"PUBL_MSG::a::a=1\""), "{content}");
    let quoted = |l: &&str| l.starts_with('"') && l.ends_with('"');
    assert!(lines.iter().all(quoted));
}

#[test]
fn cluster_log_can_be_analyzed() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("run.log");
    let config = dir.path().join("bench.toml");
    fs::write(&config, FAST_RUN).unwrap();

    sync_bench()
        .args(["cluster", "--nodes", "3", "--interval-ms", "50"])
        .args(["--seed", "5"])
        .arg("--log-file")
        .arg(&log)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("node-2"));

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.contains("NODE_INIT::node-0"));
    assert!(content.contains("RECV_MSG::node-1::node-0=1"));

    sync_bench()
        .arg("analyze")
        .arg(&log)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"nodes\": 3"))
        .stdout(predicate::str::contains("\"delivery_ratio\": 1.0"));
}

#[test]
fn quoted_prefix_is_rejected() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("run.log");

    sync_bench()
        .args(["cluster", "--nodes", "2", "--interval-ms", "50"])
        .args(["--prefix", r#"a", "b"#])
        .arg("--log-file")
        .arg(&log)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid node prefix"));
    assert!(!log.exists());
}

#[test]
fn analyze_requires_a_log_file() {
    sync_bench()
        .arg("analyze")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("WRONG_ARGS"));
}
