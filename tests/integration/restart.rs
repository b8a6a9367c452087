#[path = "common/mod.rs"]
mod common;

use common::TestBox;
use predicates::str::contains;

#[test]
fn restart_continues_past_failed_service() {
    let host = TestBox::with_failing_services(&["b"]);

    host.manage()
        .args(["restart", "a", "b", "c"])
        .assert()
        .success()
        .stderr(contains("Failed to restart 'b'"))
        .stderr(contains("Restart requested for 'a'"))
        .stderr(contains("Restart requested for 'c'"));

    assert_eq!(
        host.supervisor_calls(),
        ["restart a", "restart b", "restart c"]
    );
}

#[test]
fn restart_with_missing_supervisor_still_exits_zero() {
    let host = TestBox::new();
    std::fs::remove_file(host.root.join("bin/supervisorctl")).unwrap();

    host.manage()
        .args(["restart", "nginx"])
        .assert()
        .success()
        .stderr(contains("Failed to restart 'nginx'"));
}
