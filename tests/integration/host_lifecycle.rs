#[path = "common/mod.rs"]
mod common;

use std::fs;

use common::{TestBox, read};
use predicates::str::contains;

#[test]
fn add_list_and_delete_host() {
    let host = TestBox::new();

    host.manage()
        .args(["host", "add", "-d", "example.com", "-c", "app1", "-p", "8080"])
        .assert()
        .success();

    assert!(host.cert_dir("example.com").is_dir());
    let vhost = read(&host.vhost_file("example.com"));
    assert!(vhost.contains("return 301 https://$host$request_uri;"));
    assert!(vhost.contains("set $containerName app1;"));
    assert!(vhost.contains("set $containerPort 8080;"));
    assert_eq!(host.listed_hosts(), ["example.com"]);

    host.manage()
        .args(["host", "del", "-d", "example.com"])
        .assert()
        .success();

    assert!(!host.cert_dir("example.com").exists());
    assert!(!host.vhost_file("example.com").exists());
    assert!(host.listed_hosts().is_empty());

    let calls = host.acme_calls();
    assert_eq!(calls.len(), 4);
    assert!(calls[0].starts_with("--issue -d example.com -w "));
    assert!(calls[1].starts_with("--install-cert -d example.com "));
    assert_eq!(calls[2], "--revoke -d example.com");
    assert_eq!(calls[3], "--remove -d example.com");
    assert!(host.supervisor_calls().iter().all(|call| call == "restart nginx"));
}

#[test]
fn second_add_fails_and_changes_nothing() {
    let host = TestBox::new();
    host.manage()
        .args(["host", "add", "-d", "example.com", "-c", "app1"])
        .assert()
        .success();
    let vhost_before = read(&host.vhost_file("example.com"));
    let acme_before = host.acme_calls();

    host.manage()
        .args(["host", "add", "-d", "example.com", "-c", "app2"])
        .assert()
        .failure()
        .stderr(contains("already exists"));

    assert_eq!(read(&host.vhost_file("example.com")), vhost_before);
    assert_eq!(host.acme_calls(), acme_before);
}

#[test]
fn default_port_is_80() {
    let host = TestBox::new();
    host.manage()
        .args(["host", "add", "-d", "example.com", "-c", "app1"])
        .assert()
        .success();

    assert!(read(&host.vhost_file("example.com")).contains("set $containerPort 80;"));
}

#[test]
fn delete_unknown_host_fails() {
    let host = TestBox::new();

    host.manage()
        .args(["host", "del", "-d", "missing.org"])
        .assert()
        .failure()
        .stderr(contains("does not exist"));

    assert!(host.acme_calls().is_empty());
    assert!(host.supervisor_calls().is_empty());
}

#[test]
fn failed_issuance_aborts_add() {
    let host = TestBox::with_failing_acme();

    host.manage()
        .args(["host", "add", "-d", "example.com", "-c", "app1"])
        .assert()
        .failure()
        .stderr(contains("certificate issuance"));

    let vhost = read(&host.vhost_file("example.com"));
    assert!(vhost.contains("listen 80;"));
    assert!(!vhost.contains("listen 443 ssl;"));
    assert!(host.listed_hosts().is_empty());
}

#[test]
fn invalid_domain_is_rejected_before_any_work() {
    let host = TestBox::new();

    host.manage()
        .args(["host", "add", "-d", "bad domain", "-c", "app1"])
        .assert()
        .failure()
        .stderr(contains("not a valid domain name"));

    assert!(host.acme_calls().is_empty());
    assert!(fs::read_dir(host.root.join("conf.d")).unwrap().next().is_none());
}

#[test]
fn list_long_shows_bindings() {
    let host = TestBox::new();
    host.manage()
        .args(["host", "add", "-d", "example.com", "-c", "app1", "-p", "3000"])
        .assert()
        .success();
    fs::create_dir_all(host.cert_dir("legacy.net")).unwrap();

    let output = host.manage().args(["host", "ls", "--long"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|line| line == "example.com\tapp1:3000"));
    assert!(stdout.lines().any(|line| line == "legacy.net\t-"));
}

#[test]
fn recreate_rewrites_configs_identically() {
    let host = TestBox::new();
    for domain in ["a.com", "b.com"] {
        host.manage()
            .args(["host", "add", "-d", domain, "-c", "web", "-p", "9000"])
            .assert()
            .success();
    }
    let initial = read(&host.vhost_file("a.com"));
    let drifted = read(&host.vhost_file("b.com")).replace("listen 80;", "listen 8081;");
    fs::write(host.vhost_file("b.com"), drifted).unwrap();

    host.manage()
        .args(["host", "config", "recreate", "--all"])
        .assert()
        .success();
    let first = read(&host.vhost_file("a.com"));
    host.manage()
        .args(["host", "config", "recreate", "a.com"])
        .assert()
        .success();

    assert_eq!(first, initial);
    assert_eq!(read(&host.vhost_file("a.com")), first);
    assert!(read(&host.vhost_file("b.com")).contains("listen 80;"));
}

#[test]
fn recreate_of_missing_config_is_logged_not_fatal() {
    let host = TestBox::new();
    host.manage()
        .args(["host", "add", "-d", "a.com", "-c", "web"])
        .assert()
        .success();
    let reloads_before = host.supervisor_calls().len();

    host.manage()
        .args(["host", "config", "recreate", "missing.org", "a.com"])
        .assert()
        .success()
        .stderr(contains("missing.org"));

    assert_eq!(host.supervisor_calls().len(), reloads_before + 1);
}

#[test]
fn recreate_skips_leftover_vhost_of_removed_host() {
    let host = TestBox::new();
    host.manage()
        .args(["host", "add", "-d", "a.com", "-c", "web"])
        .assert()
        .success();
    let leftover = "server {\n    set $containerName old;\n    set $containerPort 8080;\n}\n";
    fs::write(host.vhost_file("gone.com"), leftover).unwrap();

    host.manage()
        .args(["host", "config", "recreate", "gone.com", "a.com"])
        .assert()
        .success()
        .stderr(contains("Domain 'gone.com' does not exist"));

    assert_eq!(read(&host.vhost_file("gone.com")), leftover);
    assert!(!host.cert_dir("gone.com").exists());
}
