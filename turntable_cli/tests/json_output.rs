use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir, toml: &str) -> PathBuf {
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

/// Run with `--json` and parse the single object printed on stdout.
fn run_json(toml: &str, args: &[&str]) -> (Option<i32>, Value) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, toml);
    let out = Command::cargo_bin("turntable")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .args(args)
        .output()
        .unwrap();
    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 1, "expected one JSON object, got: {stdout}");
    (out.status.code(), serde_json::from_str(lines[0]).unwrap())
}

#[test]
fn init_success_schema() {
    let (code, v) = run_json("[inventory]\nseed = 5\nfill_ratio = 1.0\n", &["init"]);
    assert_eq!(code, Some(0));
    assert_eq!(v["ok"], true);
    assert_eq!(v["command"], "init");
    assert!(v["error"].is_null());
    assert!(v["sim_ms"].as_u64().unwrap() > 0);

    let state = &v["state"];
    assert_eq!(state["initialized"], true);
    assert_eq!(state["init_step"], "IDLE");
    assert_eq!(state["qei"], 0);
    assert_eq!(state["motor"], "STOP");
    assert_eq!(state["scan_count"], 10);
    assert_eq!(state["inventory"].as_array().unwrap().len(), 10);
    assert!(state["log"][0].as_str().unwrap().contains("Initialization complete"));
}

#[test]
fn move_reports_target() {
    let (code, v) = run_json("", &["move", "--slot", "1", "--station", "2p"]);
    assert_eq!(code, Some(0));
    let target = v["target_qei"].as_u64().unwrap();
    assert_eq!(v["state"]["qei"].as_u64().unwrap(), target);
    assert!(v["state"]["target"].is_null());
    assert_eq!(v["state"]["current_slot"], 1);
}

#[test]
fn rejected_operation_schema() {
    let (code, v) = run_json(
        "[inventory]\nseed = 5\nfill_ratio = 0.0\n",
        &["reject", "--slot", "6"],
    );
    assert_eq!(code, Some(5));
    assert_eq!(v["ok"], false);
    assert_eq!(v["outcome"]["outcome"], "rejected");
    assert_eq!(v["outcome"]["reason"], "no_card");
    assert_eq!(v["error"]["reason"], "Rejected");
    assert!(v["error"]["details"]["why"].as_str().unwrap().contains("slot 6"));
    assert!(v["error"]["message"].is_string());
}

#[test]
fn home_timeout_schema() {
    let (code, v) = run_json("[timing]\nhome_timeout_ms = 100\n", &["init"]);
    assert_eq!(code, Some(3));
    assert_eq!(v["error"]["reason"], "HomeTimeout");
    assert_eq!(v["error"]["details"]["home_timeout_ms"], 100);
    assert_eq!(v["state"]["init_step"], "ERROR");
    assert_eq!(v["state"]["motor"], "STOP");
}

#[test]
fn config_error_is_structured() {
    let (code, v) = run_json("[timing]\nphysics_period_ms = 0\n", &["init"]);
    assert_eq!(code, Some(1));
    assert_eq!(v["ok"], false);
    assert_eq!(v["error"]["reason"], "Error");
    assert!(
        v["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Configuration is invalid")
    );
}
