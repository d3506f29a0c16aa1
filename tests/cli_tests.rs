//! End-to-end CLI tests driving the sk binary with redirected roots.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

use common::skill_fixture;

struct Env {
    _dir: TempDir,
    config: std::path::PathBuf,
    state: std::path::PathBuf,
    cache: std::path::PathBuf,
}

impl Env {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.json");
        let state = dir.path().join("state.json");
        let cache = dir.path().join("cache");
        Self {
            _dir: dir,
            config,
            state,
            cache,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("sk").unwrap();
        cmd.env("SK_CONFIG", &self.config)
            .env("SK_STATE", &self.state)
            .env("SK_CACHE_DIR", &self.cache)
            .env("NO_COLOR", "1");
        cmd
    }
}

#[test]
fn test_cli_help() {
    let env = Env::new();
    env.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_version() {
    let env = Env::new();
    env.cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_add_writes_config_document() {
    let env = Env::new();
    let output = env
        .cmd()
        .args(["--json", "add", "obra/tdd"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["added"], Value::Bool(true));
    assert_eq!(json["scope"], "global");

    let config: Value =
        serde_json::from_str(&std::fs::read_to_string(&env.config).unwrap()).unwrap();
    assert_eq!(config["global"][0]["source"], "obra/tdd");
    assert!(config["$schema"].as_str().is_some());
}

#[test]
fn test_add_rejects_malformed_reference() {
    let env = Env::new();
    env.cmd()
        .args(["add", "not-a-reference"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed skill reference"));
}

#[test]
fn test_add_local_requires_skill_path() {
    let env = Env::new();
    env.cmd()
        .args(["add", "local"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--skill"));
}

#[test]
fn test_remove_sweeps_configuration() {
    let env = Env::new();
    env.cmd().args(["add", "obra/tdd"]).assert().success();
    env.cmd()
        .args(["add", "obra/tdd", "--when", "*.tf"])
        .assert()
        .success();

    let output = env
        .cmd()
        .args(["--json", "remove", "obra/tdd"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["removed"], 2);

    let config: Value =
        serde_json::from_str(&std::fs::read_to_string(&env.config).unwrap()).unwrap();
    assert_eq!(config["global"].as_array().unwrap().len(), 0);
    assert_eq!(config["conditional"].as_array().unwrap().len(), 0);
}

#[test]
fn test_remove_unknown_source_is_a_noop_success() {
    let env = Env::new();
    env.cmd()
        .args(["remove", "nobody/nothing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not configured"));
}

#[test]
fn test_sync_local_skill_end_to_end() {
    let env = Env::new();
    let fixtures = TempDir::new().unwrap();
    let skill = skill_fixture(fixtures.path(), "writing");
    let project = TempDir::new().unwrap();
    std::fs::create_dir_all(project.path().join(".claude")).unwrap();

    env.cmd()
        .args([
            "add",
            "local",
            "--skill",
            skill.to_str().unwrap(),
            "--project",
            project.path().to_str().unwrap(),
        ])
        .assert()
        .success();

    let output = env
        .cmd()
        .args(["--json", "sync", "--project", project.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["outcome"]["synced"][0], "writing");

    assert!(
        project
            .path()
            .join(".claude/skills/writing/SKILL.md")
            .is_file()
    );
    assert!(env.state.is_file());

    // Second run takes the fast path.
    let output = env
        .cmd()
        .args(["--json", "sync", "--project", project.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["outcome"]["already_in_sync"], Value::Bool(true));
}

#[test]
fn test_sync_dry_run_writes_nothing() {
    let env = Env::new();
    let fixtures = TempDir::new().unwrap();
    let skill = skill_fixture(fixtures.path(), "writing");
    let project = TempDir::new().unwrap();
    std::fs::create_dir_all(project.path().join(".claude")).unwrap();

    env.cmd()
        .args([
            "add",
            "local",
            "--skill",
            skill.to_str().unwrap(),
            "--project",
            project.path().to_str().unwrap(),
        ])
        .assert()
        .success();

    env.cmd()
        .args([
            "sync",
            "--dry-run",
            "--project",
            project.path().to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(!project.path().join(".claude/skills/writing").exists());
    assert!(!env.state.exists());
}

#[test]
fn test_sync_total_failure_exits_nonzero() {
    let env = Env::new();
    let project = TempDir::new().unwrap();
    std::fs::create_dir_all(project.path().join(".claude")).unwrap();

    env.cmd()
        .args([
            "add",
            "local",
            "--skill",
            "/nonexistent/skill/dir",
            "--project",
            project.path().to_str().unwrap(),
        ])
        .assert()
        .success();

    env.cmd()
        .args(["sync", "--project", project.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to sync"));
}

#[test]
fn test_list_shows_resolved_skills() {
    let env = Env::new();
    let fixtures = TempDir::new().unwrap();
    let skill = skill_fixture(fixtures.path(), "writing");
    let project = TempDir::new().unwrap();

    env.cmd()
        .args([
            "add",
            "local",
            "--skill",
            skill.to_str().unwrap(),
            "--project",
            project.path().to_str().unwrap(),
        ])
        .assert()
        .success();

    let output = env
        .cmd()
        .args(["--json", "list", "--project", project.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["skills"][0]["installName"], "writing");
    assert_eq!(json["skills"][0]["type"], "project");
    assert_eq!(json["skills"][0]["installed"], Value::Bool(false));
}

#[test]
fn test_config_path_flag() {
    let env = Env::new();
    env.cmd()
        .args(["config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env.config.to_str().unwrap()));
}

#[test]
fn test_cache_clean_on_empty_cache() {
    let env = Env::new();
    let output = env
        .cmd()
        .args(["--json", "cache", "clean"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["removed"], 0);
    assert_eq!(json["freedBytes"], 0);
}

#[test]
fn test_cache_clean_sweeps_unreachable_entries() {
    let env = Env::new();
    // Seed two cache entries by hand; state references neither.
    let entry = env.cache.join("github/obra/tdd/sha111");
    std::fs::create_dir_all(&entry).unwrap();
    std::fs::write(entry.join("SKILL.md"), "cached").unwrap();

    let output = env
        .cmd()
        .args(["--json", "cache", "clean"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["removed"], 1);
    assert!(!entry.exists());
}

#[test]
fn test_completions_generate() {
    let env = Env::new();
    env.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sk"));
}
