use std::path::PathBuf;
use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

fn path_as_str(path: &Path) -> &str {
    path.to_str().expect("path should be valid utf-8")
}

const UNRESOLVED_PAGE: &str = r#"
<table>
  <tr><th>Name</th><th>CIDR</th></tr>
  <tr><td>Staff-Network</td><td>10.1.0.0/16</td></tr>
</table>
<table>
  <tr><th>Name</th><th>Mitglieder</th></tr>
  <tr><td>WS-Clients</td><td>Staff-Network, Well-Known-Names</td></tr>
</table>"#;

#[test]
fn analyze_reports_definitions_for_clean_page() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwdoc-migrate"));
    cmd.arg("analyze")
        .arg(fixture("fixtures/firewall_page.html"))
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dependency Analysis Report"))
        .stdout(predicate::str::contains("abc.xyz.de (host)"))
        .stdout(predicate::str::contains("Staff-Network (network)"));
}

#[test]
fn analyze_fails_on_cycles() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwdoc-migrate"));
    cmd.arg("analyze")
        .arg(fixture("fixtures/cyclic_groups.html"))
        .env("NO_COLOR", "1")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Group-A -> Group-B -> Group-A"))
        .stderr(predicate::str::contains("1 circular dependencies"));
}

#[test]
fn unresolved_references_fail_only_in_strict_mode() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("page.html");
    fs::write(&input, UNRESOLVED_PAGE).expect("write");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwdoc-migrate"));
    cmd.arg("analyze")
        .arg(path_as_str(&input))
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Well-Known-Names"));

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwdoc-migrate"));
    cmd.arg("analyze")
        .arg(path_as_str(&input))
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("strict mode"));
}

#[test]
fn analyze_emits_json() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwdoc-migrate"));
    let assert = cmd
        .arg("analyze")
        .arg(fixture("fixtures/firewall_page.html"))
        .args(["--format", "json"])
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid json");
    assert_eq!(json["definitions"]["DMZ"], "network");
    assert_eq!(json["max_depth"], 2);
    assert_eq!(json["cycles"].as_array().map(Vec::len), Some(0));
}

#[test]
fn analyze_rejects_page_without_tables() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fwdoc-migrate"));
    cmd.arg("analyze")
        .arg(fixture("fixtures/no_tables.html"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no table found"));
}
