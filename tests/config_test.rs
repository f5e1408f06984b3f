use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("claude-multi");
    cmd.env("CLAUDE_MULTI_HOME", home)
        .env_remove("CLAUDE_MULTI_SHARED_DIR")
        .env_remove("CLAUDE_MULTI_SESSIONS_DIR")
        .env_remove("CLAUDE_MULTI_CONFIG_PATH")
        .env_remove("CLAUDE_MULTI_LOGS_DIR")
        .env_remove("CLAUDE_MULTI_SYNC_ON_START")
        .env_remove("CLAUDE_MULTI_SYNC_ON_END");
    cmd
}

fn read_config(home: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(home.join("config.json")).expect("read config");
    serde_json::from_str(&raw).expect("parse config")
}

#[test]
fn init_creates_layout_and_templates() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("multi");

    cmd(&home)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("init: ok"));

    assert!(home.join("sessions").is_dir());
    assert!(home.join("logs").is_dir());
    let memory = fs::read_to_string(home.join("shared/MEMORY.md")).expect("read memory");
    assert!(memory.starts_with("# Shared Memory Across Claude Code Sessions"));
    assert!(home.join("shared/CLAUDE.md").is_file());

    let config = read_config(&home);
    assert_eq!(config["sync_on_start"], true);
    assert_eq!(config["watch_interval"], 30);
}

#[test]
fn init_keeps_existing_memory() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("multi");
    fs::create_dir_all(home.join("shared")).expect("mkdir shared");
    fs::write(home.join("shared/MEMORY.md"), "# Mine\n").expect("write memory");

    cmd(&home).arg("init").assert().success();

    let memory = fs::read_to_string(home.join("shared/MEMORY.md")).expect("read memory");
    assert_eq!(memory, "# Mine\n");
}

#[test]
fn config_set_then_get_round_trips_typed_value() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("multi");
    cmd(&home).arg("init").assert().success();

    cmd(&home)
        .args(["config", "--key", "sync_on_end", "--value", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("set sync_on_end = false"));

    cmd(&home)
        .args(["config", "-k", "sync_on_end"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sync_on_end = false"));

    assert_eq!(read_config(&home)["sync_on_end"], false);
}

#[test]
fn config_rejects_wrongly_typed_known_key() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("multi");
    cmd(&home).arg("init").assert().success();

    cmd(&home)
        .args(["config", "-k", "watch_interval", "-v", "often"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file invalid"));

    assert_eq!(read_config(&home)["watch_interval"], 30);
}

#[test]
fn config_add_and_remove_instruction_files() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("multi");
    let file: PathBuf = tmp.path().join("team.md");
    fs::write(&file, "team rules\n").expect("write team");
    cmd(&home).arg("init").assert().success();

    cmd(&home)
        .arg("config")
        .arg("--add-instructions")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("added instruction file"));
    cmd(&home)
        .arg("config")
        .arg("-a")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("already in list"));

    let listed = read_config(&home)["instruction_files"].clone();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    cmd(&home)
        .arg("config")
        .arg("--remove-instructions")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("removed instruction file"));
    assert_eq!(read_config(&home)["instruction_files"], serde_json::json!([]));
}

#[test]
fn config_show_lists_paths_and_env_overrides() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("multi");
    cmd(&home).arg("init").assert().success();

    cmd(&home)
        .env("CLAUDE_MULTI_SYNC_ON_END", "false")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("config_file="))
        .stdout(predicate::str::contains("instruction_files: (none)"))
        .stdout(predicate::str::contains("env CLAUDE_MULTI_SYNC_ON_END=false"));

    assert_eq!(read_config(&home)["sync_on_end"], true);
}

#[test]
fn status_lists_shared_files() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("multi");
    cmd(&home).arg("init").assert().success();
    fs::create_dir_all(home.join("shared/rust")).expect("mkdir topic");
    fs::write(home.join("shared/rust/errors.md"), "- use anyhow\n").expect("write topic");

    cmd(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("file=MEMORY.md"))
        .stdout(predicate::str::contains("file=rust/errors.md"));
}

#[test]
fn status_without_init_reports_missing_shared_dir() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("multi");

    cmd(&home)
        .arg("status")
        .assert()
        .failure()
        .stdout(predicate::str::contains("missing shared memory dir"));
}

#[test]
fn sessions_lists_backups_newest_first() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("multi");
    cmd(&home).arg("init").assert().success();

    cmd(&home)
        .arg("sessions")
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions tracked yet."));

    let session = home.join("sessions/api");
    fs::create_dir_all(session.join("20260101_090000")).expect("mkdir old");
    fs::create_dir_all(session.join("20260102_090000")).expect("mkdir new");

    cmd(&home)
        .arg("sessions")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "session=api snapshots=2 latest=20260102_090000",
        ));
}

#[test]
fn json_flag_emits_parseable_report() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("multi");
    cmd(&home).arg("init").assert().success();

    let output = cmd(&home)
        .args(["--json", "sessions"])
        .output()
        .expect("run sessions");
    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("parse json report");
    assert_eq!(report["command"], "sessions");
    assert_eq!(report["ok"], true);
}
