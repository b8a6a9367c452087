#[path = "common/mod.rs"]
mod common;

use std::fs;

use assert_cmd::Command;
use common::TestBox;
use predicates::boolean::PredicateBooleanExt;
use predicates::str::contains;

#[test]
fn help_lists_command_groups() {
    Command::new(assert_cmd::cargo::cargo_bin!("manage"))
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("host").and(contains("restart")));
}

#[test]
fn ls_on_empty_box_prints_nothing() {
    let host = TestBox::new();
    host.manage()
        .args(["host", "ls"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn port_zero_is_a_usage_error() {
    let host = TestBox::new();
    host.manage()
        .args(["host", "add", "-d", "example.com", "-c", "app1", "-p", "0"])
        .assert()
        .code(2);
    assert!(host.acme_calls().is_empty());
}

#[test]
fn missing_settings_file_is_fatal() {
    let host = TestBox::new();
    Command::new(assert_cmd::cargo::cargo_bin!("manage"))
        .arg("--config")
        .arg(host.root.join("nope.yaml"))
        .args(["host", "ls"])
        .assert()
        .failure()
        .stderr(contains("Failed to read settings file"));
}

#[test]
fn invalid_settings_file_is_fatal() {
    let host = TestBox::new();
    fs::write(&host.settings_path, "cert_root: [unclosed\n").unwrap();
    host.manage()
        .args(["host", "ls"])
        .assert()
        .failure()
        .stderr(contains("Invalid YAML format"));
}

#[test]
fn log_level_off_silences_logs() {
    let host = TestBox::new();
    host.manage()
        .args(["--log-level", "off", "restart", "nginx"])
        .assert()
        .success()
        .stderr("");
}
