//! Integration tests for the dinghy CLI
//!
//! These tests run the binary end-to-end against Dockerfiles in temporary
//! directories.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Helper function to create a test CLI command
#[allow(deprecated)]
fn cli() -> Command {
    let mut cmd = Command::cargo_bin("dinghy").unwrap();
    cmd.arg("--no-color");
    cmd
}

/// Write a Dockerfile into a fresh temporary directory
fn dockerfile(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("Dockerfile");
    fs::write(&path, content).unwrap();
    (temp_dir, path)
}

#[test]
fn test_help_command() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dinghy parses Dockerfiles"))
        .stdout(predicate::str::contains("dinghy refactor Dockerfile -o Dockerfile.fixed"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("refactor"));
}

#[test]
fn test_short_help_uses_about() {
    cli()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dockerfile analysis and repair"))
        .stdout(predicate::str::contains("Dinghy parses Dockerfiles").not());
}

#[test]
fn test_version_command() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(VERSION));
}

#[test]
fn test_rules_lists_catalog() {
    cli()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("aptGetInstallUseY"))
        .stdout(predicate::str::contains("curlUseFlagF"))
        .stdout(predicate::str::contains("Total: 20 rules"));
}

#[test]
fn test_rules_json() {
    let output = cli().args(["rules", "--json"]).output().unwrap();
    assert!(output.status.success());
    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rules = rules.as_array().unwrap();
    assert_eq!(rules.len(), 20);
    assert!(rules.iter().any(|rule| rule["id"] == "apkAddUseNoCache" && rule["repairable"] == true));
}

#[test]
fn test_analyze_reports_violations() {
    let (_dir, path) = dockerfile("FROM debian:12\nRUN apt-get install curl\n");
    cli()
        .arg("analyze")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("aptGetInstallUseY"))
        .stdout(predicate::str::contains("aptGetInstallRmAptLists"))
        .stdout(predicate::str::contains("Dockerfile:2:"));
}

#[test]
fn test_analyze_error_on_violation_sets_exit_code() {
    let (_dir, path) = dockerfile("FROM alpine\nRUN apk add curl\n");
    cli()
        .arg("analyze")
        .arg("--error-on-violation")
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("apkAddUseNoCache"));
}

#[test]
fn test_analyze_clean_file() {
    let (_dir, path) = dockerfile("FROM alpine\nRUN apk add --no-cache curl\n");
    cli()
        .arg("analyze")
        .arg("--error-on-violation")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("No violations found"));
}

#[test]
fn test_analyze_json_format() {
    let (_dir, path) = dockerfile("FROM alpine\nRUN apk add curl\n");
    let output = cli()
        .args(["analyze", "--format", "json"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let violations = report["violations"].as_array().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0]["ruleId"], "apkAddUseNoCache");
    assert_eq!(violations[0]["severity"], "warning");
    assert_eq!(violations[0]["position"]["lineStart"], 1);
    assert!(report["parseErrors"].as_array().unwrap().is_empty());
}

#[test]
fn test_discovered_config_disables_rule() {
    let (dir, path) = dockerfile("FROM alpine\nRUN apk add curl\n");
    fs::write(
        dir.path().join(".dinghyrc.json"),
        r#"{ "rules": { "apkAddUseNoCache": "off" } }"#,
    )
    .unwrap();

    cli()
        .arg("analyze")
        .arg("--error-on-violation")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("apkAddUseNoCache").not());
}

#[test]
fn test_config_severity_override() {
    let (dir, path) = dockerfile("FROM alpine\nRUN apk add curl\n");
    let config = dir.path().join("custom.toml");
    fs::write(&config, "[rules]\napkAddUseNoCache = \"error\"\n").unwrap();

    let output = cli()
        .arg("-c")
        .arg(&config)
        .args(["analyze", "--format", "json"])
        .arg(&path)
        .output()
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["violations"][0]["severity"], "error");
}

#[test]
fn test_missing_config_file() {
    let (dir, path) = dockerfile("FROM alpine\n");
    cli()
        .arg("--config")
        .arg(dir.path().join("missing.json"))
        .arg("analyze")
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_missing_dockerfile() {
    let dir = TempDir::new().unwrap();
    cli()
        .arg("analyze")
        .arg(dir.path().join("Dockerfile"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_refactor_prints_diff_and_writes_output() {
    let (dir, path) = dockerfile("FROM alpine:3.19\nRUN apk add curl\n");
    let out = dir.path().join("Dockerfile.fixed");

    cli()
        .arg("refactor")
        .arg(&path)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("-RUN apk add curl"))
        .stdout(predicate::str::contains("+RUN apk add --no-cache curl"))
        .stdout(predicate::str::contains(" FROM alpine:3.19"));

    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "FROM alpine:3.19\nRUN apk add --no-cache curl\n"
    );
    // the input is left alone
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "FROM alpine:3.19\nRUN apk add curl\n"
    );
}

#[test]
fn test_refactor_annotates_unrepairable_violations() {
    let (_dir, path) = dockerfile("FROM node:20\nRUN tar -xzf node.tar.gz -C /opt\n");
    cli()
        .arg("refactor")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes"))
        .stdout(predicate::str::contains("tarSomethingRmTheSomething"))
        .stdout(predicate::str::contains("no automatic repair"));
}

#[test]
fn test_parse_dumps_tree() {
    let (_dir, path) = dockerfile("FROM alpine:3.19\n");
    let output = cli().arg("parse").arg(&path).output().unwrap();
    assert!(output.status.success());

    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tree["type"], "DOCKER-FILE");
    let from = &tree["children"][0];
    assert_eq!(from["type"], "DOCKER-FROM");
    assert!(
        from["children"]
            .as_array()
            .unwrap()
            .iter()
            .any(|child| child["type"] == "DOCKER-IMAGE-NAME" && child["value"] == "alpine")
    );
}

#[test]
fn test_parse_warns_about_recovered_errors() {
    let (_dir, path) = dockerfile("RUN echo \"unterminated\n");
    cli()
        .arg("parse")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("warning:"));
}
