use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Deterministic config: every slot starts with a card.
const FULL: &str = r#"
[inventory]
seed = 1
fill_ratio = 1.0
"#;

// Every slot starts empty.
const EMPTY: &str = r#"
[inventory]
seed = 1
fill_ratio = 0.0
"#;

fn write_config(dir: &tempfile::TempDir, toml: &str) -> PathBuf {
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn turntable(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("turntable").unwrap();
    cmd.arg("--config").arg(cfg);
    cmd
}

#[rstest]
#[case(FULL, &["--help"], 0, "Usage:", "stdout")]
#[case(FULL, &["init"], 0, "init complete", "stdout")]
#[case(FULL, &["self-check"], 0, "Initialization complete, turntable ready", "stdout")]
#[case(FULL, &["move", "--slot", "0", "--station", "1p"], 0, "target: qei 1024", "stdout")]
#[case(FULL, &["dispense", "--slot", "4"], 0, "Slot 4 card dispensed", "stdout")]
#[case(FULL, &["reject", "--slot", "7"], 0, "Slot 7 card sent to reject bin", "stdout")]
#[case(EMPTY, &["refill", "--slot", "0", "--qr", "CARD-9"], 0, "slot 0: card (CARD-9)", "stdout")]
#[case(EMPTY, &["dispense", "--slot", "2"], 5, "Operation refused", "stderr")]
#[case(FULL, &["refill", "--slot", "2"], 5, "already holds a card", "stderr")]
#[case(FULL, &["move", "--slot", "10", "--station", "1p"], 1, "Slot 10 does not exist", "stderr")]
#[case(FULL, &["move", "--slot", "1", "--station", "sideways"], 1, "Unknown station", "stderr")]
#[case(FULL, &["dispense"], 2, "required", "stderr")]
fn cli_table_cases(
    #[case] toml: &str,
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, toml);

    let assert = turntable(&cfg).args(args).assert().code(exit_code);

    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn home_timeout_exits_with_init_code() {
    let dir = tempdir().unwrap();
    // One revolution from the start position takes about a second.
    let cfg = write_config(&dir, "[timing]\nhome_timeout_ms = 100\n");

    turntable(&cfg)
        .arg("init")
        .assert()
        .code(3)
        .stdout(predicate::str::contains("init step ERROR"))
        .stderr(predicate::str::contains("Homing gave up after 100 ms"));
}

#[test]
fn move_timeout_exits_with_move_code() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[timing]\nmove_timeout_ms = 50\n");

    turntable(&cfg)
        .args(["move", "--slot", "0", "--station", "1p", "--skip-init"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("did not reach qei 1024"));
}

#[test]
fn skip_init_leaves_table_uninitialized() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, FULL);

    turntable(&cfg)
        .args(["move", "--slot", "0", "--station", "refill", "--skip-init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("initialized: no"));
}

#[test]
fn alignment_gate_allows_operations_after_positioning() {
    let dir = tempdir().unwrap();
    let cfg = write_config(
        &dir,
        "[inventory]\nseed = 1\nfill_ratio = 1.0\n[safety]\nrequire_station_alignment = true\n",
    );

    turntable(&cfg)
        .args(["dispense", "--slot", "3", "--p2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Slot 3 card dispensed"));
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("does-not-exist.toml");

    Command::cargo_bin("turntable")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("self-check complete"));
}

#[test]
fn invalid_config_is_explained() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[motion]\nstep = 0\n");

    turntable(&cfg)
        .arg("init")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration is invalid"))
        .stderr(predicate::str::contains("motion.step must be > 0"));
}

#[test]
fn inventory_csv_sets_starting_cards() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, EMPTY);
    let csv = dir.path().join("inventory.csv");
    let mut f = fs::File::create(&csv).unwrap();
    writeln!(f, "slot,has_card,qr_data").unwrap();
    writeln!(f, "5,true,CARD-0005").unwrap();
    writeln!(f, "6,false,").unwrap();

    turntable(&cfg)
        .arg("--inventory")
        .arg(&csv)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("inventory: 1/10 cards"))
        .stdout(predicate::str::contains("slot 5: card (CARD-0005)"));
}

#[test]
fn inventory_csv_with_bad_header_is_reported() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, FULL);
    let csv = dir.path().join("inventory.csv");
    let mut f = fs::File::create(&csv).unwrap();
    writeln!(f, "slot,card").unwrap();
    writeln!(f, "0,true").unwrap();

    turntable(&cfg)
        .arg("--inventory")
        .arg(&csv)
        .arg("init")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Invalid headers in inventory CSV. Expected 'slot,has_card,qr_data'.",
        ));
}

#[test]
fn event_log_is_printed_oldest_first() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, FULL);

    let out = turntable(&cfg).arg("init").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let started = stdout.find("Initialization started").unwrap();
    let done = stdout.find("Initialization complete").unwrap();
    assert!(started < done);
}
