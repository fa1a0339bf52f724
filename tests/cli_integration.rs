//! Binary-level tests: argument handling, output and exit status.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::{run_git, Mirror};

/// A command for the binary, isolated from the user's global config.
fn syncdoctor(mirror: &Mirror) -> Command {
    let global = mirror.root().join("global.toml");
    if !global.exists() {
        std::fs::write(&global, "").unwrap();
    }
    let mut cmd = Command::cargo_bin("syncdoctor").unwrap();
    cmd.env("SYNCDOCTOR_CONFIG", global)
        .env_remove("RUST_LOG")
        .arg("--cwd")
        .arg(mirror.work());
    cmd
}

#[test]
fn version_flag_works() {
    Command::cargo_bin("syncdoctor")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("syncdoctor"));
}

#[test]
fn help_flag_works() {
    Command::cargo_bin("syncdoctor")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mirrored to two remotes"));
}

#[test]
fn completion_generates_script() {
    Command::cargo_bin("syncdoctor")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("syncdoctor"));
}

#[test]
fn status_reports_synced_mirror() {
    let mirror = Mirror::new();
    syncdoctor(&mirror)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("E1"))
        .stdout(predicate::str::contains("S1"))
        .stdout(predicate::str::contains("fully synced"));
}

#[test]
fn status_json_is_machine_readable() {
    let mirror = Mirror::new();
    mirror.commit("a.txt", "a");
    let output = syncdoctor(&mirror)
        .args(["status", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["sync"]["scenario"], "S2");
    assert_eq!(value["sync"]["local_core"]["ahead"], 1);
    assert_eq!(value["existence"]["scenario"], "E1");
    assert!(value["fingerprint"].as_str().is_some());
}

#[test]
fn fixes_on_synced_mirror_is_empty() {
    let mirror = Mirror::new();
    syncdoctor(&mirror)
        .arg("fixes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to fix."));
}

#[test]
fn fixes_json_lists_pushes() {
    let mirror = Mirror::new();
    mirror.commit("a.txt", "a");
    let output = syncdoctor(&mirror).args(["fixes", "--json"]).output().unwrap();
    assert!(output.status.success());

    let fixes: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let kinds: Vec<&str> = fixes
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["operation"]["kind"].as_str())
        .collect();
    assert_eq!(kinds, vec!["push", "push"]);
}

#[test]
fn fix_auto_pushes_local_commits() {
    let mirror = Mirror::new();
    let tip = mirror.commit("a.txt", "a");

    syncdoctor(&mirror)
        .args(["fix", "--auto"])
        .assert()
        .success()
        .stdout(predicate::str::contains("applied:"));

    assert_eq!(run_git(&mirror.core(), &["rev-parse", "main"]), tip);
    assert_eq!(run_git(&mirror.hub(), &["rev-parse", "main"]), tip);
}

#[test]
fn dry_run_changes_nothing() {
    let mirror = Mirror::new();
    mirror.commit("a.txt", "a");
    let before = run_git(&mirror.core(), &["rev-parse", "main"]);

    syncdoctor(&mirror)
        .args(["fix", "--auto", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would apply"));

    assert_eq!(run_git(&mirror.core(), &["rev-parse", "main"]), before);
}

#[test]
fn fix_unknown_scenario_fails() {
    let mirror = Mirror::new();
    syncdoctor(&mirror)
        .args(["fix", "--scenario", "S9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no suggested fix for scenario 'S9'"));
}

#[test]
fn divergence_cannot_be_fixed_automatically() {
    let mirror = Mirror::new();
    mirror.commit("local.txt", "local");
    mirror.advance_remote(&mirror.core(), 1);
    mirror.mirror_core_to_hub();

    syncdoctor(&mirror)
        .args(["fix", "--scenario", "S4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be fixed automatically"));
}

#[test]
fn invalid_repo_config_is_reported() {
    let mirror = Mirror::new();
    let dir = mirror.work().join(".git").join("syncdoctor");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "[platform]\nprovider = \"gitea\"\n").unwrap();

    syncdoctor(&mirror)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn fix_requires_a_selection() {
    let mirror = Mirror::new();
    syncdoctor(&mirror).arg("fix").assert().failure();
}

#[test]
fn missing_directory_reports_existence_scenario() {
    let mirror = Mirror::new();
    let global = mirror.root().join("global.toml");
    std::fs::write(
        &global,
        format!(
            "[remotes]\ncore_url = \"{}\"\nhub_url = \"{}\"\n",
            common::path_str(&mirror.core()),
            common::path_str(&mirror.hub())
        ),
    )
    .unwrap();

    Command::cargo_bin("syncdoctor")
        .unwrap()
        .env("SYNCDOCTOR_CONFIG", &global)
        .env_remove("RUST_LOG")
        .arg("--cwd")
        .arg(mirror.root().join("not-cloned-yet"))
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("E5"))
        .stderr(predicate::str::contains("failed to run git").not());
}
